use std::path::Path;

use reflow::{ConvertOptions, Converter, TargetFormat};

/// Option sources layered over the defaults, lowest precedence first.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub config: Option<&'a Path>,
    pub font: Option<&'a str>,
    pub font_size: Option<f64>,
    pub margin: Option<f64>,
}

impl Overrides<'_> {
    fn resolve(&self) -> Result<ConvertOptions, i32> {
        let mut options = match self.config {
            Some(path) => ConvertOptions::from_json_file(path).map_err(|e| {
                eprintln!("Error: invalid config {}: {e}", path.display());
                1
            })?,
            None => ConvertOptions::default(),
        };
        if let Some(font) = self.font {
            options.font = font.to_string();
        }
        if let Some(size) = self.font_size {
            options.font_size = size;
        }
        if let Some(margin) = self.margin {
            options = options.with_margin(margin);
        }
        Ok(options)
    }
}

pub fn run(
    file: &Path,
    target: TargetFormat,
    output: Option<&Path>,
    overrides: Overrides<'_>,
) -> Result<(), i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    let options = overrides.resolve()?;

    let written = Converter::new(options)
        .convert(file, target, output)
        .map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;
    println!("{}", written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let options = Overrides {
            font: Some("Courier"),
            margin: Some(10.0),
            ..Overrides::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(options.font, "Courier");
        assert_eq!(options.margin_bottom, 10.0);
        assert_eq!(options.font_size, 12.0);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("opts.json");
        std::fs::write(&config, r#"{"font_size": 9, "margin_left": 20}"#).unwrap();

        let options = Overrides {
            config: Some(&config),
            font_size: Some(11.0),
            ..Overrides::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(options.font_size, 11.0);
        assert_eq!(options.margin_left, 20.0);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let result = Overrides {
            config: Some(Path::new("/no/such/opts.json")),
            ..Overrides::default()
        }
        .resolve();
        assert_eq!(result.unwrap_err(), 1);
    }
}
