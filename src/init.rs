//! Site initialization module.
//!
//! Creates new site structure with default configuration, a starter
//! layout and an index page.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "stanza.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &["content", "templates/layouts", "templates/partials"];

/// Starter `default` layout: embeds the page via the `body` fragment.
const DEFAULT_LAYOUT: &str = "\
<!DOCTYPE html>
<html>
<head>
  <meta charset=\"utf-8\">
  <title>{{title}}</title>
  <link rel=\"stylesheet\" href=\"{{root}}style.css\">
</head>
<body>
{{> body}}
</body>
</html>
";

/// Starter index page with front matter.
const INDEX_PAGE: &str = "\
+++
title = \"Home\"
+++
<h1>{{title}}</h1>
<p>Edit content/index.hbs to get started.</p>
";

/// Create a new site with default structure
pub fn new_site(config: &'static SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `stanza init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_starter_files(root)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `stanza init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write the starter layout and index page
fn init_starter_files(root: &Path) -> Result<()> {
    fs::write(root.join("templates/layouts/default.hbs"), DEFAULT_LAYOUT)?;
    fs::write(root.join("content/index.hbs"), INDEX_PAGE)?;
    Ok(())
}
