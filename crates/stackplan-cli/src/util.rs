use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read as _, Write},
    path::Path,
};

use anyhow::Context;

/// Writes `value` as pretty JSON followed by a newline, to `path` or to stdout.
pub fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let (mut writer, target): (Box<dyn Write>, String) = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            (Box::new(BufWriter::new(file)), path.display().to_string())
        }
        None => (Box::new(io::stdout().lock()), "stdout".to_owned()),
    };
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {target}"))?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to flush output to {target}"))
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

/// Reads a whole text file, or standard input when `path` is `None`.
pub fn read_text_input(file_kind: &str, path: Option<&Path>) -> anyhow::Result<String> {
    let mut text = String::new();
    match path {
        Some(path) => {
            File::open(path)
                .and_then(|mut file| file.read_to_string(&mut text))
                .with_context(|| {
                    format!("Failed to read {file_kind} file: {}", path.display())
                })?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut text)
                .with_context(|| format!("Failed to read {file_kind} from stdin"))?;
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("stackplan-util-{}.json", std::process::id()));
        let value = BTreeMap::from([("hole_count".to_owned(), -1.5_f32)]);
        write_json(&value, Some(&path)).unwrap();
        let restored: BTreeMap<String, f32> = read_json_file("test", &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = read_json_file::<u32, _>("model", "/nonexistent/stackplan.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stackplan.json"));
    }
}
