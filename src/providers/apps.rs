//! Application launcher with fuzzy name matching.
//!
//! Installed applications are discovered per platform:
//!
//! | Platform | Source |
//! |----------|--------|
//! | Linux    | `.desktop` entries in the XDG application dirs |
//! | macOS    | `.app` bundles in `/Applications`, `/System/Applications`, `~/Applications` |
//! | Windows  | none; the name is handed to `start` |

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{reap, ProviderError};

/// Minimum Jaro-Winkler similarity for a fuzzy hit.
const FUZZY_THRESHOLD: f64 = 0.75;

// ---------------------------------------------------------------------------
// AppEntry
// ---------------------------------------------------------------------------

/// How an installed application is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// Program and arguments from a `.desktop` `Exec=` line.
    Exec(Vec<String>),
    /// A macOS bundle, started with `open -a`.
    Bundle(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    /// Display name, e.g. `"Calculator"`.
    pub name: String,
    pub launch: Launch,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Launch the application best matching `name`.
///
/// With `fuzzy_match` the closest installed name wins; without it the name
/// must match exactly, ignoring case.
pub async fn open_application(name: &str, fuzzy_match: bool) -> Result<(), ProviderError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ProviderError::NotFound("no application name given".into()));
    }

    tokio::task::spawn_blocking(move || {
        let installed = installed_applications();
        let found = if fuzzy_match {
            best_match(&name, &installed)
        } else {
            installed
                .iter()
                .find(|app| app.name.eq_ignore_ascii_case(&name))
        };

        match found {
            Some(app) => {
                log::info!("providers: launching {:?} for {name:?}", app.name);
                launch(app)
            }
            None if cfg!(target_os = "windows") => start_by_name(&name),
            None => Err(ProviderError::NotFound(format!("application {name:?}"))),
        }
    })
    .await
    .map_err(|e| ProviderError::Launch(e.to_string()))?
}

/// Pick the entry closest to `query`.
///
/// Exact (case-insensitive) names beat prefixes, prefixes beat substrings,
/// and anything else must clear [`FUZZY_THRESHOLD`].
pub fn best_match<'a>(query: &str, apps: &'a [AppEntry]) -> Option<&'a AppEntry> {
    let query = query.to_lowercase();

    apps.iter()
        .filter_map(|app| {
            let name = app.name.to_lowercase();
            let score = if name == query {
                3.0
            } else if name.starts_with(&query) {
                2.0 + strsim::jaro_winkler(&query, &name)
            } else if name.contains(&query) {
                1.0 + strsim::jaro_winkler(&query, &name)
            } else {
                let sim = strsim::jaro_winkler(&query, &name);
                if sim < FUZZY_THRESHOLD {
                    return None;
                }
                sim
            };
            Some((app, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(app, _)| app)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Every application found on this machine.
pub fn installed_applications() -> Vec<AppEntry> {
    let mut apps = Vec::new();

    if cfg!(target_os = "macos") {
        let mut roots = vec![
            PathBuf::from("/Applications"),
            PathBuf::from("/System/Applications"),
        ];
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join("Applications"));
        }
        for root in roots {
            apps.extend(scan_bundles(&root));
        }
    } else if cfg!(unix) {
        let mut roots = vec![
            PathBuf::from("/usr/share/applications"),
            PathBuf::from("/usr/local/share/applications"),
            PathBuf::from("/var/lib/flatpak/exports/share/applications"),
        ];
        if let Some(data) = dirs::data_dir() {
            roots.push(data.join("applications"));
        }
        for root in roots {
            apps.extend(scan_desktop_entries(&root));
        }
    }

    log::debug!("providers: {} applications discovered", apps.len());
    apps
}

fn scan_desktop_entries(dir: &Path) -> Vec<AppEntry> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "desktop"))
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .filter_map(|contents| parse_desktop_entry(&contents))
        .collect()
}

fn scan_bundles(dir: &Path) -> Vec<AppEntry> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "app"))
        .filter_map(|p| {
            let name = p.file_stem()?.to_string_lossy().into_owned();
            Some(AppEntry {
                name,
                launch: Launch::Bundle(p),
            })
        })
        .collect()
}

/// Read `Name=` and `Exec=` from the `[Desktop Entry]` group.
///
/// Hidden entries (`NoDisplay=true`, `Hidden=true`) are skipped.
pub fn parse_desktop_entry(contents: &str) -> Option<AppEntry> {
    let mut in_entry = false;
    let mut name = None;
    let mut exec = None;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "Name" if name.is_none() => name = Some(value.trim().to_string()),
            "Exec" if exec.is_none() => exec = Some(exec_argv(value)),
            "NoDisplay" | "Hidden" if value.trim() == "true" => return None,
            _ => {}
        }
    }

    let argv = exec.filter(|argv| !argv.is_empty())?;
    Some(AppEntry {
        name: name?,
        launch: Launch::Exec(argv),
    })
}

/// Split an `Exec=` value into argv, dropping `%f`-style field codes.
fn exec_argv(exec: &str) -> Vec<String> {
    exec.split_whitespace()
        .filter(|arg| !(arg.len() == 2 && arg.starts_with('%')))
        .map(|arg| arg.trim_matches('"').to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Launching
// ---------------------------------------------------------------------------

fn launch(app: &AppEntry) -> Result<(), ProviderError> {
    let spawned = match &app.launch {
        Launch::Exec(argv) => Command::new(&argv[0]).args(&argv[1..]).spawn(),
        Launch::Bundle(path) => Command::new("open").arg("-a").arg(path).spawn(),
    };
    let child = spawned.map_err(|e| ProviderError::Launch(format!("{}: {e}", app.name)))?;
    reap(child, app.name.clone());
    Ok(())
}

fn start_by_name(name: &str) -> Result<(), ProviderError> {
    let child = Command::new("cmd")
        .args(["/C", "start", "", name])
        .spawn()
        .map_err(|e| ProviderError::Launch(format!("{name}: {e}")))?;
    reap(child, format!("start {name}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str) -> AppEntry {
        AppEntry {
            name: name.into(),
            launch: Launch::Exec(vec![name.to_lowercase()]),
        }
    }

    #[test]
    fn exact_name_wins_over_prefix() {
        let apps = [app("Calculator Pro"), app("Calculator")];
        assert_eq!(best_match("calculator", &apps).unwrap().name, "Calculator");
    }

    #[test]
    fn prefix_beats_substring() {
        let apps = [app("GNOME Terminal"), app("Terminator")];
        assert_eq!(best_match("term", &apps).unwrap().name, "Terminator");
    }

    #[test]
    fn typo_still_matches() {
        let apps = [app("Firefox"), app("Files")];
        assert_eq!(best_match("firefux", &apps).unwrap().name, "Firefox");
    }

    #[test]
    fn unrelated_name_is_rejected() {
        let apps = [app("Firefox"), app("Calculator")];
        assert!(best_match("spreadsheet", &apps).is_none());
    }

    #[test]
    fn desktop_entry_is_parsed() {
        let contents = "\
[Desktop Entry]
Type=Application
Name=Calculator
Name[de]=Rechner
Exec=gnome-calculator %U
";
        assert_eq!(
            parse_desktop_entry(contents),
            Some(AppEntry {
                name: "Calculator".into(),
                launch: Launch::Exec(vec!["gnome-calculator".into()]),
            })
        );
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let contents = "[Desktop Entry]\nName=Helper\nExec=helper\nNoDisplay=true\n";
        assert!(parse_desktop_entry(contents).is_none());
    }

    #[test]
    fn action_groups_do_not_override_main_entry() {
        let contents = "\
[Desktop Entry]
Name=Firefox
Exec=firefox %u

[Desktop Action new-window]
Name=New Window
Exec=firefox --new-window %u
";
        let entry = parse_desktop_entry(contents).unwrap();
        assert_eq!(entry.name, "Firefox");
        assert_eq!(entry.launch, Launch::Exec(vec!["firefox".into()]));
    }

    #[tokio::test]
    async fn empty_name_is_not_found() {
        assert!(matches!(
            open_application("   ", true).await,
            Err(ProviderError::NotFound(_))
        ));
    }
}
