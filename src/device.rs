//! Device session driver.
//!
//! Input events, screen captures and app restarts go through `adb`, one
//! blocking subprocess per call.

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use crate::layout::{ScreenPoint, Swipe};

/// A simulated input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    Tap(ScreenPoint),
    Swipe(Swipe),
}

impl InputCommand {
    /// Arguments for `adb shell input ...`
    pub fn shell_args(&self) -> Vec<String> {
        match self {
            InputCommand::Tap(p) => vec![
                "input".to_string(),
                "tap".to_string(),
                p.x.to_string(),
                p.y.to_string(),
            ],
            InputCommand::Swipe(s) => vec![
                "input".to_string(),
                "swipe".to_string(),
                s.from.x.to_string(),
                s.from.y.to_string(),
                s.to.x.to_string(),
                s.to.y.to_string(),
            ],
        }
    }
}

impl std::fmt::Display for InputCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.shell_args().join(" "))
    }
}

/// The remote device: one visible screen, driven strictly sequentially.
pub trait DeviceDriver {
    fn issue_input(&mut self, command: &InputCommand) -> Result<()>;
    fn capture_screen(&mut self) -> Result<RgbaImage>;
    /// Force-stops the app and launches it again from its launcher activity.
    fn restart_app(&mut self, package: &str) -> Result<()>;
}

/// Android device or emulator reachable through adb.
pub struct AdbDevice {
    adb_path: PathBuf,
    serial: Option<String>,
}

impl AdbDevice {
    pub fn new(adb_path: PathBuf, serial: Option<String>) -> Self {
        Self { adb_path, serial }
    }

    fn adb(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<Vec<u8>> {
        let output = cmd
            .output()
            .with_context(|| format!("Failed to run {}", self.adb_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("adb failed: {}", stderr.trim()));
        }

        Ok(output.stdout)
    }
}

impl DeviceDriver for AdbDevice {
    fn issue_input(&mut self, command: &InputCommand) -> Result<()> {
        debug!("adb shell {}", command);
        let mut cmd = self.adb();
        cmd.arg("shell").args(command.shell_args());
        self.run(cmd)?;
        Ok(())
    }

    fn capture_screen(&mut self) -> Result<RgbaImage> {
        let mut cmd = self.adb();
        cmd.args(["exec-out", "screencap", "-p"]);
        let png = self.run(cmd)?;

        let img = image::load_from_memory(&png).context("Failed to decode device screenshot")?;
        Ok(img.to_rgba8())
    }

    fn restart_app(&mut self, package: &str) -> Result<()> {
        info!("Restarting {}", package);
        for args in restart_commands(package) {
            let mut cmd = self.adb();
            cmd.arg("shell").args(&args);
            self.run(cmd)?;
        }
        Ok(())
    }
}

/// `adb shell` argument lists that stop and relaunch an app.
fn restart_commands(package: &str) -> [Vec<String>; 2] {
    let stop = ["am", "force-stop", package];
    let launch = [
        "monkey",
        "-p",
        package,
        "-c",
        "android.intent.category.LAUNCHER",
        "1",
    ];
    [
        stop.iter().map(|a| a.to_string()).collect(),
        launch.iter().map(|a| a.to_string()).collect(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_args() {
        let tap = InputCommand::Tap(ScreenPoint::new(690, 285));
        assert_eq!(tap.to_string(), "input tap 690 285");
    }

    #[test]
    fn test_swipe_args() {
        let swipe = InputCommand::Swipe(Swipe {
            from: ScreenPoint::new(690, 605),
            to: ScreenPoint::new(690, 540),
        });
        assert_eq!(swipe.to_string(), "input swipe 690 605 690 540");
    }

    #[test]
    fn test_restart_stops_then_launches() {
        let [stop, launch] = restart_commands("com.lilithgame.roc.gp");
        assert_eq!(stop.join(" "), "am force-stop com.lilithgame.roc.gp");
        assert_eq!(
            launch.join(" "),
            "monkey -p com.lilithgame.roc.gp -c android.intent.category.LAUNCHER 1"
        );
    }

    #[test]
    fn test_serial_is_passed_first() {
        let device = AdbDevice::new(PathBuf::from("adb"), Some("emulator-5554".to_string()));
        let args: Vec<String> = device
            .adb()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args, ["-s", "emulator-5554"]);
    }
}
