use std::{path::PathBuf, sync::LazyLock};

pub static DEFAULT_APP_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    let mut path = dirs::home_dir().unwrap_or_default();

    if std::env::var("CREAMDECK_XDG_PATH").is_ok() {
        path.push(".config")
    }

    path.push("CreamDeck");
    path
});

/// Computes a path under the CreamDeck app directory.
///
/// Returns a `&Path` referencing the app directory itself if no arguments are passed in, or a
/// `PathBuf` created by joining all of the arguments to the app directory if at least one
/// argument is passed in.
///
/// # Examples
///
/// ```no_run
/// // Assuming `CREAMDECK_XDG_PATH` is not set, the app directory is ~/CreamDeck
/// let home = dirs::home_dir().unwrap_or_default();
/// assert_eq!(creamdeck::app_path!(), home.join("CreamDeck").as_path());
/// assert_eq!(creamdeck::app_path!("logs"), home.join("CreamDeck").join("logs"));
/// ```
#[macro_export]
macro_rules! app_path {
    () => {
        $crate::paths::DEFAULT_APP_PATH.as_path()
    };

    ( $( $path:expr ),+ $(,)? ) => {
        [
            $crate::paths::DEFAULT_APP_PATH.as_path(),
            $( std::path::Path::new(&$path) ),+
        ].into_iter().collect::<std::path::PathBuf>()
    };
}
