use anyhow::Result;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse `KEY=VALUE` lines; blank lines and `#` comments are skipped and
/// surrounding quotes are stripped from values.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, val)) = s.split_once('=') else {
            warn!("Ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let val = val.trim();
        let unquoted = if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            &val[1..val.len() - 1]
        } else {
            val
        };
        map.insert(key.trim().to_string(), unquoted.to_string());
    }
    map
}

/// Parse a `.env` file if it exists. Does not modify the process environment.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    Ok(parse_env_str(&fs::read_to_string(path)?))
}

/// Load `.env` from the working directory into the process environment.
/// Variables that are already set are left alone.
pub fn load_dotenv_if_present() -> Result<()> {
    for (k, v) in parse_env_file(Path::new(".env"))? {
        if std::env::var_os(&k).is_none() {
            unsafe {
                std::env::set_var(&k, &v);
            }
        }
    }
    Ok(())
}

/// Generate a .env.template file with placeholder values and comments.
pub fn write_env_template(path: &Path) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# fighter_reconcile environment configuration template
# Copy this file to .env and adjust as needed.
# Any of these variables can also be provided via the system environment;
# command-line flags take precedence over both.

# Log filter (error, warn, info, debug, trace)
RUST_LOG=info

# Minimum similarity for the fuzzy pass, in (0, 1]
#FIGHTER_RECONCILE_FUZZY_THRESHOLD=0.85

# JSON file with column names, manual overrides and fuzzy exclusions
#FIGHTER_RECONCILE_CONFIG=reconcile.json
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}
