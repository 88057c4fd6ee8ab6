use std::{
    fs,
    path::{Path, PathBuf},
};

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::MANIFEST;

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
#[serde(default)]
pub struct Manifest {
    pub project: Project,
    pub build: Build,
    pub deploy: Deploy,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
#[serde(default)]
pub struct Project {
    // shown in the header of generated programs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    // semver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Build {
    /// Relative to the project root.
    pub output: String,
    /// The shared setup snippet, relative to the project root.
    pub setup: String,
}

impl Default for Build {
    fn default() -> Build {
        Build {
            output: "hub_main.py".to_string(),
            setup: "setup.py".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Deploy {
    pub hub: String,
    pub tool: String,
}

impl Default for Deploy {
    fn default() -> Deploy {
        Deploy {
            hub: "Pybricks Hub".to_string(),
            tool: "pybricksdev".to_string(),
        }
    }
}

impl Manifest {
    pub fn new(name: String) -> Manifest {
        Manifest {
            project: Project {
                name: Some(name),
                version: Some(format!("{}", Version::new(0, 1, 0))),
            },
            ..Default::default()
        }
    }

    /// Searches `path` and its parents for a manifest.
    /// Without one, the defaults apply and `path` is the project root.
    pub fn find(path: &Path) -> Result<(Manifest, PathBuf), String> {
        let mut dir = Some(path);

        while let Some(current) = dir {
            let file = current.join(MANIFEST);
            if file.is_file() {
                let source = fs::read_to_string(&file)
                    .map_err(|e| format!("The manifest file `{}` could not be read: {}", file.display(), e))?;
                let manifest = Manifest::parse(&source)
                    .map_err(|e| format!("Could not parse `{}`: {}", file.display(), e))?;
                return Ok((manifest, current.to_owned()));
            }
            dir = current.parent();
        }

        Ok((Manifest::default(), path.to_owned()))
    }

    pub fn parse(source: &str) -> Result<Manifest, String> {
        let manifest: Manifest = toml::from_str(source).map_err(|e| e.to_string())?;
        if let Some(version) = &manifest.project.version {
            Version::parse(version).map_err(|e| format!("invalid version `{}`: {}", version, e))?;
        }
        Ok(manifest)
    }

    pub fn render(&self) -> Result<String, String> {
        toml::to_string(self).map_err(|e| e.to_string())
    }

    /// `name version`, or whichever of the two is set.
    pub fn label(&self) -> Option<String> {
        match (&self.project.name, &self.project.version) {
            (Some(name), Some(version)) => Some(format!("{} {}", name, version)),
            (Some(name), None) => Some(name.clone()),
            (None, Some(version)) => Some(version.clone()),
            (None, None) => None,
        }
    }

    /// The output flag if given, else the manifest's, under `root`.
    pub fn output(&self, flag: Option<PathBuf>, root: &Path) -> PathBuf {
        flag.unwrap_or_else(|| root.join(&self.build.output))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_manifest_is_all_defaults() {
        assert_eq!(Manifest::parse("").unwrap(), Manifest::default());
    }

    #[test]
    fn partial_manifest() {
        let manifest = Manifest::parse(
            "[project]\nname = \"spike\"\n\n[deploy]\nhub = \"Left Hub\"\n",
        )
        .unwrap();
        assert_eq!(manifest.label(), Some("spike".to_string()));
        assert_eq!(manifest.deploy.hub, "Left Hub");
        assert_eq!(manifest.deploy.tool, "pybricksdev");
        assert_eq!(manifest.build.output, "hub_main.py");
    }

    #[test]
    fn version_must_be_semver() {
        assert!(Manifest::parse("[project]\nversion = \"1.2\"\n").is_err());
        assert!(Manifest::parse("[project]\nversion = \"1.2.3\"\n").is_ok());
    }

    #[test]
    fn new_manifest_reparses() {
        let manifest = Manifest::new("spike".to_string());
        let text = manifest.render().unwrap();
        assert_eq!(Manifest::parse(&text).unwrap(), manifest);
        assert_eq!(manifest.label(), Some("spike 0.1.0".to_string()));
    }

    #[test]
    fn output_flag_wins() {
        let manifest = Manifest::default();
        let root = Path::new("robot");
        assert_eq!(manifest.output(None, root), root.join("hub_main.py"));
        assert_eq!(manifest.output(Some(PathBuf::from("x.py")), root), PathBuf::from("x.py"));
    }
}
