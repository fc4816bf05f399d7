mod cache;
mod chooser;
mod config;
mod error;
mod executor;
mod model;
mod parser;
mod sources;

use crate::cache::{Cache, ScanSettings};
use crate::chooser::Chooser;
use crate::config::{load_config, Config};
use crate::executor::{select, Launcher};
use crate::model::Candidate;
use crate::sources::desktop::{DesktopSource, ResolvePolicy, SearchPath};
use crate::sources::Source;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use regex::Regex;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chooser command line, e.g. "rofi -dmenu"
    #[arg(long)]
    chooser: Option<String>,

    /// Neither read nor write the candidate cache
    #[arg(long)]
    no_cache: bool,

    /// Rescan applications and refresh the cache
    #[arg(long)]
    rebuild: bool,

    /// Print candidate names and exit
    #[arg(long)]
    list: bool,

    /// Print the command that would run instead of running it
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // 1. Load Config
    let mut config = load_config(args.config.as_deref())?;
    if let Some(chooser) = &args.chooser {
        config.chooser.command = chooser.clone();
    }

    // 2. Resolve candidates, from cache when possible
    let search_path = SearchPath::from_env();
    let candidates = load_candidates(&config, &args, &search_path)?;
    let candidates = apply_excludes(candidates, &config.search.exclude)?;

    if args.list {
        for candidate in &candidates {
            println!("{}", candidate.name);
        }
        return Ok(());
    }

    // 3. Ask the chooser
    let chooser = Chooser::from_command_line(&config.chooser.command, config.chooser.max_response_bytes)?;
    let names = candidates.iter().map(|c| c.name.clone()).collect();
    let Some(choice) = chooser.choose(names)? else {
        debug!("Nothing chosen");
        return Ok(());
    };

    // 4. Launch
    let Some(candidate) = select(&candidates, &choice) else {
        info!("No application named {:?}", choice);
        return Ok(());
    };

    let launcher = Launcher::from_config(&config.launch);
    if args.dry_run {
        println!("{}", launcher.command_line(candidate));
        return Ok(());
    }
    launcher.launch(candidate)?;

    Ok(())
}

fn load_candidates(config: &Config, args: &Args, search_path: &SearchPath) -> Result<Vec<Candidate>> {
    let use_cache = config.cache.enabled && !args.no_cache;
    let cache = if use_cache {
        Cache::open_default()
            .inspect_err(|err| warn!("Cache unavailable: {}", err))
            .ok()
    } else {
        None
    };

    let settings = ScanSettings {
        skip_hidden: config.search.skip_hidden,
        sort_entries: config.search.sort_entries,
    };

    if let Some(cache) = cache.as_ref().filter(|_| !args.rebuild) {
        if let Some(candidates) = cache.load_fresh(search_path, settings) {
            info!("Loaded {} candidates from {:?}", candidates.len(), cache.path());
            return Ok(candidates);
        }
    }

    let mut source = DesktopSource::new(search_path.clone());
    source.policy = ResolvePolicy {
        skip_hidden: settings.skip_hidden,
    };
    source.sort_entries = settings.sort_entries;
    let candidates = source.scan()?;

    if let Some(cache) = &cache {
        if let Err(err) = cache.write(search_path, settings, &candidates) {
            warn!("Failed to write cache {:?}: {}", cache.path(), err);
        }
    }

    Ok(candidates)
}

/// Drop candidates whose display name matches any of `patterns`.
fn apply_excludes(candidates: Vec<Candidate>, patterns: &[String]) -> Result<Vec<Candidate>> {
    if patterns.is_empty() {
        return Ok(candidates);
    }

    let regexes = patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid exclude pattern {:?}", p)))
        .collect::<Result<Vec<_>>>()?;

    Ok(candidates
        .into_iter()
        .filter(|c| !regexes.iter().any(|re| re.is_match(&c.name)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_matching_names() {
        let candidates = vec![
            Candidate::new("Avahi Browser", "avahi"),
            Candidate::new("Firefox", "firefox"),
            Candidate::new("Display Settings", "settings"),
        ];
        let kept = apply_excludes(candidates, &["^Avahi".to_string(), "Settings$".to_string()]).unwrap();
        assert_eq!(kept, vec![Candidate::new("Firefox", "firefox")]);
    }

    #[test]
    fn bad_exclude_pattern_is_an_error() {
        assert!(apply_excludes(vec![], &["(".to_string()]).is_err());
    }

    #[test]
    fn parses_flags() {
        let args = Args::parse_from(["deskrun", "--chooser", "rofi -dmenu", "--rebuild", "--dry-run"]);
        assert_eq!(args.chooser.as_deref(), Some("rofi -dmenu"));
        assert!(args.rebuild);
        assert!(args.dry_run);
        assert!(!args.no_cache);
    }
}
