//! Lenient INI round-tripping for the server `Game.ini` / `GameUserSettings.ini`.
//!
//! Keys keep their case and order. A repeated `[Section]` header continues the
//! first section of that name, and repeated keys inside a section are kept as
//! separate entries because ARK list settings are written that way.

use crate::error::{ConfigError, WriteStage};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const FIELD_DELIMITER: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Empty for keys that appear before the first header.
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn is_implicit(&self) -> bool {
        self.name.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(entry_key, _)| entry_key == key)
            .map(|(_, value)| value.as_str())
    }
}

/// One editable input of the generated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub id: String,
    pub section: String,
    pub key: String,
    pub value: String,
}

pub fn field_id(section: &str, key: &str) -> String {
    format!("{section}{FIELD_DELIMITER}{key}")
}

impl ConfigDocument {
    pub fn parse_str(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut document = ConfigDocument::default();
        let mut current: Option<usize> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.len() > 2 && line.starts_with('[') && line.ends_with(']') {
                let name = &line[1..line.len() - 1];
                current = Some(document.section_index_or_insert(name));
                continue;
            }

            let Some((key, value)) = split_entry(line) else {
                warn!(line = index + 1, content = line, "skipping malformed config line");
                continue;
            };

            let section_index = match current {
                Some(section_index) => section_index,
                None => document.section_index_or_insert(""),
            };
            document.sections[section_index]
                .entries
                .push((key.to_string(), value.to_string()));
        }

        document
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|section| section.name == name) {
            return index;
        }
        self.sections.push(Section::new(name));
        self.sections.len() - 1
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|section| section.get(key))
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|section| section.entries.len()).sum()
    }

    /// Field ids are unique over the document: the n-th repeat of an id gets a
    /// `#n` suffix, bumped further if that name is already taken.
    pub fn fields(&self) -> Vec<FormField> {
        let mut used = HashSet::new();
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut fields = Vec::with_capacity(self.entry_count());

        for section in &self.sections {
            for (key, value) in &section.entries {
                let base = field_id(&section.name, key);
                let occurrence = occurrences.entry(base.clone()).or_insert(0);
                *occurrence += 1;
                let mut id = if *occurrence == 1 {
                    base.clone()
                } else {
                    format!("{}#{}", base, *occurrence)
                };
                while used.contains(&id) {
                    *occurrence += 1;
                    id = format!("{}#{}", base, *occurrence);
                }
                used.insert(id.clone());
                fields.push(FormField {
                    id,
                    section: section.name.clone(),
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }

        fields
    }

    /// Returns the number of entries whose value changed. Ids missing from
    /// `edits` leave their entry untouched.
    pub fn apply_edits(&mut self, edits: &HashMap<String, String>) -> usize {
        let mut ids = self.fields().into_iter().map(|field| field.id);
        let mut changed = 0;

        for section in &mut self.sections {
            for (_, value) in &mut section.entries {
                let Some(id) = ids.next() else {
                    return changed;
                };
                if let Some(submitted) = edits.get(&id) {
                    let submitted = single_line(submitted);
                    if *value != submitted {
                        *value = submitted;
                        changed += 1;
                    }
                }
            }
        }

        changed
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if !section.is_implicit() {
                out.push_str(&format!("[{}]\n", section.name));
            }
            for (key, value) in &section.entries {
                out.push_str(&format!("{key} = {value}\n"));
            }
            out.push('\n');
        }
        out
    }
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let position = line.find(|c: char| c == '=' || c == ':')?;
    let key = line[..position].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[position + 1..].trim()))
}

// Values are written one per line.
fn single_line(value: &str) -> String {
    value.trim().replace(['\r', '\n'], " ")
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

pub async fn parse(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let document = ConfigDocument::parse_str(&text);
    debug!(
        path = %path.display(),
        sections = document.sections.len(),
        entries = document.entry_count(),
        "parsed config"
    );
    Ok(document)
}

/// Writes the unedited `document` to `<path>.bak`, then the edited copy to
/// `path`. The writes are not atomic: a `.bak` file does not mean `path` was
/// updated.
pub async fn save(
    path: &Path,
    document: &ConfigDocument,
    edits: &HashMap<String, String>,
) -> Result<usize, ConfigError> {
    let backup = backup_path(path);
    tokio::fs::write(&backup, document.serialize())
        .await
        .map_err(|source| ConfigError::Io {
            stage: WriteStage::Backup,
            path: backup.clone(),
            source,
        })?;

    let mut updated = document.clone();
    let changed = updated.apply_edits(edits);

    tokio::fs::write(path, updated.serialize())
        .await
        .map_err(|source| ConfigError::Io {
            stage: WriteStage::Primary,
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), changed, "saved config");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_key_case_and_order() {
        let document = ConfigDocument::parse_str(
            "[ServerSettings]\nDifficultyOffset=1.0\nServerPVE=True\nallowThirdPersonPlayer=False\n",
        );
        let section = document.section("ServerSettings").expect("section");
        let keys: Vec<&str> = section.entries.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["DifficultyOffset", "ServerPVE", "allowThirdPersonPlayer"]);
        assert_eq!(document.get("ServerSettings", "serverpve"), None);
    }

    #[test]
    fn duplicate_section_header_continues_first_section() {
        let document = ConfigDocument::parse_str("[A]\nx=1\n[B]\ny=2\n[A]\nz=3\n");
        assert_eq!(document.sections.len(), 2);
        let a = document.section("A").expect("A");
        assert_eq!(
            a.entries,
            vec![("x".to_string(), "1".to_string()), ("z".to_string(), "3".to_string())]
        );
        assert_eq!(document.get("B", "y"), Some("2"));
    }

    #[test]
    fn repeated_keys_are_all_retained() {
        let document = ConfigDocument::parse_str(
            "[/script/shootergame.shootergamemode]\nOverridePlayerLevelEngramPoints=5\nOverridePlayerLevelEngramPoints=8\n",
        );
        let section = document
            .section("/script/shootergame.shootergamemode")
            .expect("section");
        let values: Vec<&str> = section.values("OverridePlayerLevelEngramPoints").collect();
        assert_eq!(values, vec!["5", "8"]);
    }

    #[test]
    fn keys_before_first_header_use_implicit_section() {
        let document = ConfigDocument::parse_str("Loose=1\n[S]\nk=v\n");
        assert!(document.sections[0].is_implicit());
        assert_eq!(document.get("", "Loose"), Some("1"));
        assert_eq!(document.serialize(), "Loose = 1\n\n[S]\nk = v\n\n");
    }

    #[test]
    fn skips_comments_and_malformed_lines() {
        let document = ConfigDocument::parse_str(
            "\u{feff}; comment\n[S]\n# other\nnot a pair\n=orphan\n[]\nk : v\n",
        );
        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.entry_count(), 1);
        assert_eq!(document.get("S", "k"), Some("v"));
    }

    #[test]
    fn first_delimiter_splits_entry() {
        let document = ConfigDocument::parse_str("[S]\nSessionName=Island: PvE = fun\n");
        assert_eq!(document.get("S", "SessionName"), Some("Island: PvE = fun"));
    }

    #[test]
    fn field_ids_are_unique_for_repeats_and_collisions() {
        let document = ConfigDocument::parse_str("[a__b]\nc=1\n[a]\nb__c=2\nk=3\nk=4\n");
        let ids: Vec<String> = document.fields().into_iter().map(|field| field.id).collect();
        assert_eq!(ids, vec!["a__b__c", "a__b__c#2", "a__k", "a__k#2"]);
    }

    #[test]
    fn apply_edits_touches_only_submitted_fields() {
        let mut document = ConfigDocument::parse_str("[S]\na=1\nb=2\nb=3\n");
        let mut edits = HashMap::new();
        edits.insert("S__b#2".to_string(), " 30\n".to_string());
        edits.insert("S__missing".to_string(), "x".to_string());

        assert_eq!(document.apply_edits(&edits), 1);
        let values: Vec<&str> = document.section("S").expect("S").values("b").collect();
        assert_eq!(values, vec!["2", "30"]);
        assert_eq!(document.get("S", "a"), Some("1"));
    }

    #[test]
    fn serializes_in_configparser_layout() {
        let document = ConfigDocument::parse_str("[A]\nx=1\nempty=\n[B]\ny = two words\n");
        assert_eq!(
            document.serialize(),
            "[A]\nx = 1\nempty = \n\n[B]\ny = two words\n\n"
        );
    }

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/srv/ark/Game.ini")),
            PathBuf::from("/srv/ark/Game.ini.bak")
        );
    }
}
