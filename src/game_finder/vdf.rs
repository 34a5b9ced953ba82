//! Hand-rolled VDF (Valve Data Format) parser
//!
//! Parses KeyValues1 text such as appmanifest_*.acf without external
//! dependencies. Keys are matched case-insensitively on lookup.

use std::collections::HashMap;
use std::fs;
use std::iter::Peekable;
use std::path::{Component, Path};

use thiserror::Error;

/// Why a manifest could not be turned into an [`AppManifest`]
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed VDF: {0}")]
    Malformed(String),

    #[error("manifest has no installdir key")]
    MissingInstallDir,

    #[error("manifest installdir {0:?} is not a plain folder name")]
    InvalidInstallDir(String),
}

/// A VDF value - either a string or a nested object
#[derive(Debug, Clone)]
pub enum VdfValue {
    String(String),
    Object(HashMap<String, VdfValue>),
}

impl VdfValue {
    /// Get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VdfValue::String(s) => Some(s),
            VdfValue::Object(_) => None,
        }
    }

    /// Get as object reference
    pub fn as_object(&self) -> Option<&HashMap<String, VdfValue>> {
        match self {
            VdfValue::String(_) => None,
            VdfValue::Object(o) => Some(o),
        }
    }

    /// Get a nested value by key, ignoring ASCII case
    pub fn get(&self, key: &str) -> Option<&VdfValue> {
        let object = self.as_object()?;
        object.get(key).or_else(|| {
            object
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Get a string value by key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
}

/// Parse VDF content into a root object
pub fn parse_vdf(content: &str) -> Result<VdfValue, ManifestError> {
    let mut chars = content.chars().peekable();
    parse_object(&mut chars, false)
}

/// Parse an object body. `nested` objects must be closed by `}`; the root
/// must not be.
fn parse_object<I: Iterator<Item = char> + Clone>(
    chars: &mut Peekable<I>,
    nested: bool,
) -> Result<VdfValue, ManifestError> {
    let mut map = HashMap::new();

    loop {
        skip_whitespace_and_comments(chars);

        match chars.peek() {
            None if nested => return Err(malformed("unexpected end of input, missing '}'")),
            None => break,
            Some('}') if nested => {
                chars.next();
                break;
            }
            Some('}') => return Err(malformed("unbalanced '}'")),
            Some('{') => return Err(malformed("object without a key")),
            Some(_) => {
                let key = parse_token(chars)?;
                skip_whitespace_and_comments(chars);

                match chars.peek() {
                    Some('{') => {
                        chars.next();
                        let value = parse_object(chars, true)?;
                        map.insert(key, value);
                    }
                    Some('}') | None => {
                        return Err(malformed(&format!("key {:?} has no value", key)));
                    }
                    Some(_) => {
                        let value = parse_token(chars)?;
                        map.insert(key, VdfValue::String(value));
                    }
                }
            }
        }
    }

    Ok(VdfValue::Object(map))
}

/// Parse either a quoted string or a bare word
fn parse_token<I: Iterator<Item = char>>(chars: &mut Peekable<I>) -> Result<String, ManifestError> {
    if chars.peek() == Some(&'"') {
        return parse_quoted_string(chars);
    }

    let mut result = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || matches!(c, '"' | '{' | '}') {
            break;
        }
        result.push(c);
        chars.next();
    }
    Ok(result)
}

/// Parse a quoted string "..."
fn parse_quoted_string<I: Iterator<Item = char>>(
    chars: &mut Peekable<I>,
) -> Result<String, ManifestError> {
    if chars.next() != Some('"') {
        return Err(malformed("expected '\"'"));
    }

    let mut result = String::new();

    loop {
        match chars.next() {
            None => return Err(malformed("unterminated string")),
            Some('"') => break,
            Some('\\') => match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => return Err(malformed("unterminated string")),
            },
            Some(c) => result.push(c),
        }
    }

    Ok(result)
}

/// Skip whitespace and // comments
fn skip_whitespace_and_comments<I: Iterator<Item = char> + Clone>(chars: &mut Peekable<I>) {
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        if chars.peek() != Some(&'/') {
            break;
        }

        // Only "//" is a comment; a lone '/' stays in the stream as the
        // start of a bare word
        let mut ahead = chars.clone();
        ahead.next();
        if ahead.peek() != Some(&'/') {
            break;
        }
        while chars.peek().is_some_and(|c| *c != '\n') {
            chars.next();
        }
    }
}

fn malformed(reason: &str) -> ManifestError {
    ManifestError::Malformed(reason.to_string())
}

/// The parts of an appmanifest_*.acf file needed to locate a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    pub install_dir: String,
    pub app_id: Option<String>,
    pub name: Option<String>,
}

impl AppManifest {
    /// Read and parse a manifest file
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_vdf(&content)
    }

    /// Parse from VDF content.
    ///
    /// The values live under `"AppState"`. A manifest without that key may
    /// still carry exactly one top-level object, which is used instead.
    pub fn from_vdf(content: &str) -> Result<Self, ManifestError> {
        let root = parse_vdf(content)?;
        let app_state = match root.get("AppState") {
            Some(value) => value,
            None => single_top_level_object(&root)?,
        };
        if app_state.as_object().is_none() {
            return Err(malformed("AppState is not an object"));
        }

        let install_dir = app_state
            .get_str("installdir")
            .ok_or(ManifestError::MissingInstallDir)?;

        if !is_plain_folder_name(install_dir) {
            return Err(ManifestError::InvalidInstallDir(install_dir.to_string()));
        }

        Ok(Self {
            install_dir: install_dir.to_string(),
            app_id: app_state.get_str("appid").map(String::from),
            name: app_state.get_str("name").map(String::from),
        })
    }
}

/// The only top-level object of a manifest without an `AppState` key
fn single_top_level_object(root: &VdfValue) -> Result<&VdfValue, ManifestError> {
    let mut objects = root
        .as_object()
        .into_iter()
        .flat_map(|o| o.values())
        .filter(|v| v.as_object().is_some());

    match (objects.next(), objects.next()) {
        (Some(object), None) => Ok(object),
        (None, _) => Err(malformed("no top-level object")),
        (Some(_), Some(_)) => Err(malformed("more than one top-level object")),
    }
}

/// `installdir` is joined onto `steamapps/common`, so it must stay inside it
fn is_plain_folder_name(dir: &str) -> bool {
    let path = Path::new(dir);
    !dir.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_appmanifest() {
        let content = r#"
"AppState"
{
    "appid"         "480"
    "Universe"      "1"
    "name"          "Spacewar"
    "StateFlags"    "4"
    "installdir"    "Spacewar"
    "UserConfig"
    {
        "language"  "english"
    }
}
"#;
        let manifest = AppManifest::from_vdf(content).unwrap();
        assert_eq!(manifest.install_dir, "Spacewar");
        assert_eq!(manifest.app_id.as_deref(), Some("480"));
        assert_eq!(manifest.name.as_deref(), Some("Spacewar"));
    }

    #[test]
    fn test_installdir_is_case_insensitive() {
        let content = "\"AppState\" { \"InstallDir\" \"Half-Life 2\" }";
        let manifest = AppManifest::from_vdf(content).unwrap();
        assert_eq!(manifest.install_dir, "Half-Life 2");
    }

    #[test]
    fn test_bare_words_and_comments() {
        let content = r#"
// written by hand
AppState
{
    appid 220 // trailing comment
    installdir "Half-Life 2"
}
"#;
        let manifest = AppManifest::from_vdf(content).unwrap();
        assert_eq!(manifest.install_dir, "Half-Life 2");
        assert_eq!(manifest.app_id.as_deref(), Some("220"));
    }

    #[test]
    fn test_leading_slash_is_kept_in_bare_words() {
        assert!(matches!(
            AppManifest::from_vdf("AppState { installdir /etc }"),
            Err(ManifestError::InvalidInstallDir(dir)) if dir == "/etc"
        ));

        let root = parse_vdf("AppState { path /mnt/games // comment\n }").unwrap();
        assert_eq!(
            root.get("AppState").and_then(|s| s.get_str("path")),
            Some("/mnt/games")
        );
    }

    #[test]
    fn test_appstate_preferred_over_other_objects() {
        let content = r#"
"UserConfig" { "installdir" "Wrong" }
"appstate" { "installdir" "Spacewar" }
"#;
        for _ in 0..8 {
            assert_eq!(AppManifest::from_vdf(content).unwrap().install_dir, "Spacewar");
        }
    }

    #[test]
    fn test_several_objects_without_appstate_are_malformed() {
        let content = "\"One\" { \"installdir\" \"A\" }\n\"Two\" { \"installdir\" \"B\" }";
        assert!(matches!(
            AppManifest::from_vdf(content),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_installdir() {
        let content = "\"AppState\" { \"appid\" \"480\" }";
        assert!(matches!(
            AppManifest::from_vdf(content),
            Err(ManifestError::MissingInstallDir)
        ));
    }

    #[test]
    fn test_rejects_escaping_installdir() {
        for dir in ["", "   ", "/etc", "../../outside", "a/../../b"] {
            let content = format!("\"AppState\" {{ \"installdir\" \"{}\" }}", dir);
            assert!(
                matches!(
                    AppManifest::from_vdf(&content),
                    Err(ManifestError::InvalidInstallDir(_))
                ),
                "accepted {:?}",
                dir
            );
        }
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "\"AppState\" { \"installdir\" \"Spacewar\"",
            "\"AppState\" { \"installdir\" \"Spacewar }",
            "\"AppState\" { \"installdir\" }",
            "\"AppState\" } \"installdir\" \"Spacewar\"",
            "\"installdir\" \"Spacewar\"",
            "",
        ];
        for content in cases {
            assert!(
                matches!(
                    AppManifest::from_vdf(content),
                    Err(ManifestError::Malformed(_))
                ),
                "accepted {:?}",
                content
            );
        }
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppManifest::read(&dir.path().join("appmanifest_1.acf")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
