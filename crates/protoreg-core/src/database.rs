//! Desktop database commands: default-handler binding and cache refresh.

use std::path::Path;

use tracing::debug;

use crate::{
    error::ProtoregResult,
    exec::{run_checked, CommandRunner},
};

/// Front end for the binder and refresher programs.
pub struct DesktopDatabase<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    binder: &'a str,
    refresher: &'a str,
}

impl<'a, R: CommandRunner + ?Sized> DesktopDatabase<'a, R> {
    pub fn new(runner: &'a R, binder: &'a str, refresher: &'a str) -> Self {
        Self {
            runner,
            binder,
            refresher,
        }
    }

    /// Records `filename` as the default handler of every type in `mimetypes`.
    ///
    /// Runs `<binder> default <filename> <mimetype...>` as a single invocation.
    pub fn set_default(&self, filename: &str, mimetypes: &[String]) -> ProtoregResult<()> {
        let mut args = Vec::with_capacity(mimetypes.len() + 2);
        args.push("default".to_string());
        args.push(filename.to_string());
        args.extend(mimetypes.iter().cloned());

        run_checked(self.runner, self.binder, &args)?;
        debug!(filename = filename, count = mimetypes.len(), "default handler bound");
        Ok(())
    }

    /// Rebuilds the MIME cache of `dir`.
    pub fn refresh(&self, dir: &Path) -> ProtoregResult<()> {
        let args = [dir.to_string_lossy().into_owned()];
        run_checked(self.runner, self.refresher, &args)?;
        debug!(dir = %dir.display(), "desktop database refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{error::ProtoregError, exec::testing::RecordingRunner};

    #[test]
    fn test_set_default_argument_order() {
        let runner = RecordingRunner::default();
        let db = DesktopDatabase::new(&runner, "xdg-mime", "update-desktop-database");

        db.set_default(
            "app1-opener.desktop",
            &[
                "x-scheme-handler/one".to_string(),
                "x-scheme-handler/two".to_string(),
                "text/x-one".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(
            runner.calls(),
            vec![vec![
                "xdg-mime",
                "default",
                "app1-opener.desktop",
                "x-scheme-handler/one",
                "x-scheme-handler/two",
                "text/x-one",
            ]]
        );
    }

    #[test]
    fn test_refresh_passes_directory() {
        let runner = RecordingRunner::default();
        let db = DesktopDatabase::new(&runner, "xdg-mime", "/opt/bin/refresh");

        db.refresh(&PathBuf::from("/home/u/.local/share/applications"))
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![vec!["/opt/bin/refresh", "/home/u/.local/share/applications"]]
        );
    }

    #[test]
    fn test_refresh_failure() {
        let runner = RecordingRunner::default().fail(1, "cannot write cache");
        let db = DesktopDatabase::new(&runner, "xdg-mime", "update-desktop-database");

        let err = db.refresh(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, ProtoregError::CommandFailed { ref program, .. } if program == "update-desktop-database"));
    }
}
