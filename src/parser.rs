//! Line-oriented parser for `.desktop` files.
//!
//! Only a fixed whitelist of keys is recognized. Unknown keys, comments,
//! blank lines and anything before the first group header are dropped.

use crate::error::ParseError;
use std::fs;
use std::path::Path;

/// Keys recognized inside a group, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesktopKey {
    Type,
    Version,
    Name,
    GenericName,
    NoDisplay,
    Comment,
    Icon,
    Hidden,
    OnlyShowIn,
    NotShowIn,
    DBusActivatable,
    TryExec,
    Exec,
    Path,
    Terminal,
    Actions,
    MimeType,
    Categories,
    Implements,
    Keywords,
    StartupNotify,
    StartupWMClass,
    Url,
}

impl DesktopKey {
    pub const ALL: [DesktopKey; 23] = [
        DesktopKey::Type,
        DesktopKey::Version,
        DesktopKey::Name,
        DesktopKey::GenericName,
        DesktopKey::NoDisplay,
        DesktopKey::Comment,
        DesktopKey::Icon,
        DesktopKey::Hidden,
        DesktopKey::OnlyShowIn,
        DesktopKey::NotShowIn,
        DesktopKey::DBusActivatable,
        DesktopKey::TryExec,
        DesktopKey::Exec,
        DesktopKey::Path,
        DesktopKey::Terminal,
        DesktopKey::Actions,
        DesktopKey::MimeType,
        DesktopKey::Categories,
        DesktopKey::Implements,
        DesktopKey::Keywords,
        DesktopKey::StartupNotify,
        DesktopKey::StartupWMClass,
        DesktopKey::Url,
    ];

    /// The line prefix that introduces this key, `=` included.
    pub fn prefix(self) -> &'static str {
        match self {
            DesktopKey::Type => "Type=",
            DesktopKey::Version => "Version=",
            DesktopKey::Name => "Name=",
            DesktopKey::GenericName => "GenericName=",
            DesktopKey::NoDisplay => "NoDisplay=",
            DesktopKey::Comment => "Comment=",
            DesktopKey::Icon => "Icon=",
            DesktopKey::Hidden => "Hidden=",
            DesktopKey::OnlyShowIn => "OnlyShowIn=",
            DesktopKey::NotShowIn => "NotShowIn=",
            DesktopKey::DBusActivatable => "DBusActivatable=",
            DesktopKey::TryExec => "TryExec=",
            DesktopKey::Exec => "Exec=",
            DesktopKey::Path => "Path=",
            DesktopKey::Terminal => "Terminal=",
            DesktopKey::Actions => "Actions=",
            DesktopKey::MimeType => "MimeType=",
            DesktopKey::Categories => "Categories=",
            DesktopKey::Implements => "Implements=",
            DesktopKey::Keywords => "Keywords=",
            DesktopKey::StartupNotify => "StartupNotify=",
            DesktopKey::StartupWMClass => "StartupWMClass=",
            DesktopKey::Url => "URL=",
        }
    }

    #[allow(dead_code)]
    pub fn as_str(self) -> &'static str {
        self.prefix().trim_end_matches('=')
    }

    /// Match `line` against the whitelist, returning the key and the value after `=`.
    pub fn match_line(line: &str) -> Option<(DesktopKey, &str)> {
        DesktopKey::ALL
            .iter()
            .find_map(|&key| line.strip_prefix(key.prefix()).map(|value| (key, value)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: DesktopKey,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub entries: Vec<Entry>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// First value stored under `key`.
    #[allow(dead_code)]
    pub fn get(&self, key: DesktopKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Descriptor {
    pub id: Option<String>,
    pub groups: Vec<Group>,
}

impl Descriptor {
    /// First group called `name`; later groups with the same name are shadowed.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Read and parse the descriptor at `path`. Opening or reading the file is the only failure.
pub fn parse_file(path: &Path) -> Result<Descriptor, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    let mut descriptor = parse_str(&content);
    descriptor.id = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string);
    Ok(descriptor)
}

pub fn parse_str(content: &str) -> Descriptor {
    let mut descriptor = Descriptor::default();
    // Index of the group receiving entries; None before the first header
    // and after a header with no closing bracket.
    let mut current: Option<usize> = None;

    for line in content.lines() {
        if line.starts_with('[') {
            current = match line.rfind(']') {
                Some(close) => {
                    descriptor.groups.push(Group::new(&line[1..close]));
                    Some(descriptor.groups.len() - 1)
                }
                None => None,
            };
            continue;
        }

        let Some(idx) = current else { continue };

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = DesktopKey::match_line(line) {
            descriptor.groups[idx].entries.push(Entry {
                key,
                value: value.to_string(),
            });
        }
    }

    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
# leading comment
Name=Ignored
[Desktop Entry]
Type=Application
Name=Firefox
Name[de]=Feuerfuchs
Foo=bar
Exec=firefox %u

# trailing comment
[Desktop Action new-window]
Name=New Window
Exec=firefox --new-window %u
";

    #[test]
    fn splits_groups_and_entries() {
        let d = parse_str(FIREFOX);
        assert_eq!(d.groups.len(), 2);
        assert_eq!(d.groups[0].name, "Desktop Entry");
        assert_eq!(d.groups[1].name, "Desktop Action new-window");

        let keys: Vec<DesktopKey> = d.groups[0].entries.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![DesktopKey::Type, DesktopKey::Name, DesktopKey::Exec]);
        assert_eq!(d.groups[0].get(DesktopKey::Exec), Some("firefox %u"));
    }

    #[test]
    fn lines_before_first_group_are_dropped() {
        let d = parse_str(FIREFOX);
        let names: Vec<&str> = d
            .groups
            .iter()
            .flat_map(|g| g.entries.iter())
            .filter(|e| e.key == DesktopKey::Name)
            .map(|e| e.value.as_str())
            .collect();
        assert_eq!(names, vec!["Firefox", "New Window"]);
    }

    #[test]
    fn unknown_keys_produce_no_entry() {
        let d = parse_str("[Desktop Entry]\nFoo=bar\nname=lower\n");
        assert!(d.groups[0].entries.is_empty());
    }

    #[test]
    fn group_name_spans_to_last_bracket() {
        let d = parse_str("[a]b]\nName=x\n");
        assert_eq!(d.groups[0].name, "a]b");
    }

    #[test]
    fn unterminated_header_closes_current_group() {
        let d = parse_str("[Desktop Entry]\nName=A\n[broken\nExec=leaked\n[Other]\nExec=b\n");
        assert_eq!(d.groups.len(), 2);
        assert_eq!(d.groups[0].entries.len(), 1);
        assert_eq!(d.groups[0].get(DesktopKey::Exec), None);
        assert_eq!(d.groups[1].get(DesktopKey::Exec), Some("b"));
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let d = parse_str("[G]\nName=one\nName=two\n[G]\nName=three\n");
        assert_eq!(d.groups.iter().filter(|g| g.name == "G").count(), 2);
        let first = d.group("G").unwrap();
        assert_eq!(first.entries.len(), 2);
        assert_eq!(first.get(DesktopKey::Name), Some("one"));
    }

    #[test]
    fn value_keeps_inner_equals_and_drops_crlf() {
        let d = parse_str("[Desktop Entry]\r\nExec=env A=1 app\r\nURL=http://x/?a=b\r\n");
        assert_eq!(d.groups[0].name, "Desktop Entry");
        assert_eq!(d.groups[0].get(DesktopKey::Exec), Some("env A=1 app"));
        assert_eq!(d.groups[0].get(DesktopKey::Url), Some("http://x/?a=b"));
    }

    #[test]
    fn prefix_order_distinguishes_similar_keys() {
        let d = parse_str("[Desktop Entry]\nGenericName=Browser\nTryExec=ff\n");
        let e = &d.groups[0].entries;
        assert_eq!(e[0].key, DesktopKey::GenericName);
        assert_eq!(e[1].key, DesktopKey::TryExec);
        assert_eq!(DesktopKey::StartupWMClass.as_str(), "StartupWMClass");
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_str(FIREFOX), parse_str(FIREFOX));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let path = std::env::temp_dir().join("deskrun-does-not-exist.desktop");
        assert!(matches!(
            parse_file(&path),
            Err(ParseError::FileOpen { .. })
        ));
    }
}
