//! Flat `section.key=value` settings persistence.
//!
//! Components expose their persisted values through [`ParameterSet`]: a
//! section name plus named float/bool parameters with get/set accessors.
//! There is no global registry; callers hand the sets to load/save explicitly.
//!
//! Loading never fails on content. Malformed lines, unknown names and
//! unparsable values are reported as [`Diagnostic`]s and skipped.

use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::error::SettingsError;

/// Directory under `$HOME` holding the settings file.
pub const CONFIG_DIR_NAME: &str = ".fluxscope";
pub const CONFIG_FILE_NAME: &str = "prefs";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            ParamValue::Float(v) => Some(v),
            ParamValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Bool(v) => Some(v),
            ParamValue::Float(_) => None,
        }
    }

    /// Parse `text` as a value of the same type as `self`.
    pub fn parse_like(&self, text: &str) -> Option<ParamValue> {
        match self {
            ParamValue::Float(_) => text
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParamValue::Float),
            ParamValue::Bool(_) => match text {
                "1" | "true" => Some(ParamValue::Bool(true)),
                "0" | "false" => Some(ParamValue::Bool(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Shortest representation that parses back to the same f32.
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{}", u8::from(*v)),
        }
    }
}

/// A value a component changed on its own (clamping, drags), for the control
/// layer to pick up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub name: &'static str,
    pub value: ParamValue,
}

/// Named float/bool parameters of one settings section.
pub trait ParameterSet {
    fn section(&self) -> &'static str;

    /// Parameter names, in the order they are written and restored.
    fn parameter_names(&self) -> &'static [&'static str];

    fn parameter(&self, name: &str) -> Option<ParamValue>;

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), SettingsError>;
}

/// Append `section.key=value` lines for every parameter of `set`.
pub fn write_section(set: &dyn ParameterSet, out: &mut String) {
    for &name in set.parameter_names() {
        if let Some(value) = set.parameter(name) {
            out.push_str(&format!("{}.{}={}\n", set.section(), name, value));
        }
    }
}

pub fn write_sections(sets: &[&dyn ParameterSet]) -> String {
    let mut out = String::new();
    for set in sets {
        write_section(*set, &mut out);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The line does not follow `section.key=value`.
    Malformed,
    UnknownSection(String),
    UnknownKey { section: String, key: String },
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::Malformed => write!(f, "line {}: malformed setting", self.line),
            DiagnosticKind::UnknownSection(section) => {
                write!(f, "line {}: no settings section '{section}'", self.line)
            }
            DiagnosticKind::UnknownKey { section, key } => {
                write!(f, "line {}: unknown setting '{section}.{key}'", self.line)
            }
            DiagnosticKind::InvalidValue { key, value } => {
                write!(f, "line {}: invalid value '{value}' for '{key}'", self.line)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsEntry {
    pub line: usize,
    pub section: String,
    pub key: String,
    pub value: String,
}

/// Parsed settings text, not yet applied to any component.
#[derive(Debug, Clone, Default)]
pub struct SettingsDocument {
    entries: Vec<SettingsEntry>,
}

impl SettingsDocument {
    pub fn parse(text: &str) -> (Self, Vec<Diagnostic>) {
        let mut entries = Vec::new();
        let mut diagnostics = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            match parse_line(raw) {
                Ok(Some((section, key, value))) => entries.push(SettingsEntry {
                    line,
                    section: section.to_owned(),
                    key: key.to_owned(),
                    value: value.to_owned(),
                }),
                Ok(None) => {}
                Err(()) => diagnostics.push(Diagnostic {
                    line,
                    kind: DiagnosticKind::Malformed,
                }),
            }
        }

        (Self { entries }, diagnostics)
    }

    pub fn entries(&self) -> &[SettingsEntry] {
        &self.entries
    }

    /// Last entry for `section.key`; later lines override earlier ones.
    pub fn get(&self, section: &str, key: &str) -> Option<&SettingsEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.section == section && e.key == key)
    }

    /// Apply the document to `sets`, each in its own parameter order.
    pub fn apply(&self, sets: &mut [&mut dyn ParameterSet]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for set in sets.iter_mut() {
            let section = set.section();
            for &name in set.parameter_names() {
                let Some(entry) = self.get(section, name) else {
                    continue;
                };
                let Some(current) = set.parameter(name) else {
                    continue;
                };
                let parsed = current.parse_like(&entry.value);
                let applied = parsed.map(|value| set.set_parameter(name, value));
                if !matches!(applied, Some(Ok(()))) {
                    diagnostics.push(Diagnostic {
                        line: entry.line,
                        kind: DiagnosticKind::InvalidValue {
                            key: entry.key.clone(),
                            value: entry.value.clone(),
                        },
                    });
                }
            }
        }

        for entry in &self.entries {
            match sets.iter().find(|set| set.section() == entry.section) {
                None => diagnostics.push(Diagnostic {
                    line: entry.line,
                    kind: DiagnosticKind::UnknownSection(entry.section.clone()),
                }),
                Some(set) if !set.parameter_names().iter().any(|n| *n == entry.key) => {
                    diagnostics.push(Diagnostic {
                        line: entry.line,
                        kind: DiagnosticKind::UnknownKey {
                            section: entry.section.clone(),
                            key: entry.key.clone(),
                        },
                    })
                }
                Some(_) => {}
            }
        }

        diagnostics.sort_by_key(|d| d.line);
        diagnostics
    }
}

/// Parse and apply settings text, logging every diagnostic.
pub fn load_str(text: &str, sets: &mut [&mut dyn ParameterSet]) -> Vec<Diagnostic> {
    let (document, mut diagnostics) = SettingsDocument::parse(text);
    diagnostics.extend(document.apply(sets));
    diagnostics.sort_by_key(|d| d.line);
    for diagnostic in &diagnostics {
        warn!("[settings] {diagnostic}");
    }
    diagnostics
}

/// Split `section.key=value`. `Ok(None)` for blank lines.
fn parse_line(line: &str) -> Result<Option<(&str, &str, &str)>, ()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (section, rest) = line.split_once('.').ok_or(())?;
    let (key, value) = rest.split_once('=').ok_or(())?;
    let (section, key, value) = (section.trim_end(), key.trim(), value.trim());

    let is_name = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace);
    if !is_name(section) || !is_name(key) || value.is_empty() {
        return Err(());
    }
    Ok(Some((section, key, value)))
}

/// Settings file on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.fluxscope/prefs`
    pub fn default_location() -> Result<Self, SettingsError> {
        let home = std::env::var_os("HOME").ok_or(SettingsError::NoHomeDir)?;
        Ok(Self::new(
            PathBuf::from(home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore `sets` from the file. A missing file yields no diagnostics.
    pub fn load(&self, sets: &mut [&mut dyn ParameterSet]) -> Result<Vec<Diagnostic>, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("[settings] no settings file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(load_str(&text, sets))
    }

    /// Write every section, replacing the previous file.
    pub fn save(&self, sets: &[&dyn ParameterSet]) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, write_sections(sets))?;
        info!("[settings] saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Knobs {
        gain: f32,
        mute: bool,
    }

    impl ParameterSet for Knobs {
        fn section(&self) -> &'static str {
            "Knobs"
        }

        fn parameter_names(&self) -> &'static [&'static str] {
            &["gain", "mute"]
        }

        fn parameter(&self, name: &str) -> Option<ParamValue> {
            match name {
                "gain" => Some(ParamValue::Float(self.gain)),
                "mute" => Some(ParamValue::Bool(self.mute)),
                _ => None,
            }
        }

        fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), SettingsError> {
            let mismatch = || SettingsError::TypeMismatch {
                name: name.to_owned(),
                expected: "other",
            };
            match name {
                "gain" => self.gain = value.as_float().ok_or_else(mismatch)?,
                "mute" => self.mute = value.as_bool().ok_or_else(mismatch)?,
                _ => {
                    return Err(SettingsError::UnknownParameter {
                        section: self.section().to_owned(),
                        name: name.to_owned(),
                    })
                }
            }
            Ok(())
        }
    }

    #[test]
    fn writes_one_line_per_parameter() {
        let knobs = Knobs {
            gain: 0.25,
            mute: true,
        };
        assert_eq!(write_sections(&[&knobs]), "Knobs.gain=0.25\nKnobs.mute=1\n");
    }

    #[test]
    fn parses_with_loose_whitespace() {
        assert_eq!(
            parse_line("  Knobs.gain =  1.5  "),
            Ok(Some(("Knobs", "gain", "1.5")))
        );
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("Knobs.gain"), Err(()));
        assert_eq!(parse_line("Knobs gain=1"), Err(()));
        assert_eq!(parse_line("Knobs.gain="), Err(()));
    }

    #[test]
    fn skips_bad_lines_and_keeps_loading() {
        let mut knobs = Knobs::default();
        let text = "garbage\nKnobs.gain=0.5\nKnobs.mute=maybe\nOther.x=1\nKnobs.volume=3\nKnobs.mute=true\n";

        let diagnostics = load_str(text, &mut [&mut knobs]);

        assert_eq!(knobs.gain, 0.5);
        assert!(knobs.mute);
        let lines: Vec<usize> = diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 4, 5]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Malformed);
        assert_eq!(
            diagnostics[1].kind,
            DiagnosticKind::UnknownSection("Other".into())
        );
    }

    #[test]
    fn reports_unparsable_value_of_last_entry() {
        let mut knobs = Knobs::default();
        let diagnostics = load_str("Knobs.gain=loud\n", &mut [&mut knobs]);
        assert_eq!(knobs.gain, 0.0);
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                line: 1,
                kind: DiagnosticKind::InvalidValue {
                    key: "gain".into(),
                    value: "loud".into()
                }
            }]
        );
    }

    #[test]
    fn float_formatting_round_trips_exactly() {
        for v in [0.1f32, 1.0 / 3.0, 1e-7, 12345.678, -0.01] {
            let text = ParamValue::Float(v).to_string();
            assert_eq!(
                ParamValue::Float(0.0).parse_like(&text),
                Some(ParamValue::Float(v))
            );
        }
        assert_eq!(ParamValue::Float(0.0).parse_like("NaN"), None);
    }

    #[test]
    fn store_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("prefs"));
        let mut knobs = Knobs::default();

        assert!(store.load(&mut [&mut knobs]).unwrap().is_empty());

        knobs.gain = 2.0;
        store.save(&[&knobs]).unwrap();
        let mut restored = Knobs::default();
        store.load(&mut [&mut restored]).unwrap();
        assert_eq!(restored.gain, 2.0);
    }
}
