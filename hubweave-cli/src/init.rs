use std::{fs, path::PathBuf};

use crate::{manifest::Manifest, status::Status, MANIFEST};

/// Writes a default manifest, leaving an existing one alone.
pub fn init(path: PathBuf) -> Result<(), String> {
    let name = path
        .file_name()
        .ok_or("The project path has no directory name")?
        .to_str()
        .ok_or("The project name must be valid UTF-8")?
        .to_string();

    fs::create_dir_all(&path)
        .map_err(|e| format!("Could not create `{}`: {}", path.display(), e))?;

    let file = path.join(MANIFEST);
    if file.exists() {
        Status::warn().log(&format!("`{}` already exists; left as is", file.display()));
        return Ok(());
    }

    let text = Manifest::new(name).render()?;
    fs::write(&file, text).map_err(|e| format!("Could not write `{}`: {}", file.display(), e))?;

    Status::created().log(&file.display().to_string());
    Ok(())
}
