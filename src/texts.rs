use std::fs;
use std::io::Read;
use std::path::Path;

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

static TEXT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

/// Built-in practice material.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Topic {
    #[default]
    English,
    /// Spanish sentences glossed in English.
    Spanish,
    /// Short snippets with line breaks and indentation.
    Code,
}

impl Topic {
    pub fn passages(self) -> Result<Vec<String>> {
        let file_name = format!("{self}.txt");
        let contents = TEXT_DIR
            .get_file(&file_name)
            .and_then(|file| file.contents_utf8())
            .ok_or_else(|| Error::UnknownTopic {
                name: self.to_string(),
            })?;

        let passages = split_passages(contents);
        if passages.is_empty() {
            return Err(Error::UnknownTopic {
                name: self.to_string(),
            });
        }
        Ok(passages)
    }
}

/// Passages are separated by one or more blank lines.
pub fn split_passages(contents: &str) -> Vec<String> {
    let normalized = contents.replace("\r\n", "\n");
    let mut passages = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in normalized.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                passages.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        passages.push(current.join("\n"));
    }
    passages
}

/// Where the next practice text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextSource {
    Topic {
        topic: Topic,
        passages: Vec<String>,
        last: Option<usize>,
    },
    Custom {
        label: String,
        text: String,
    },
}

impl TextSource {
    pub fn topic(topic: Topic) -> Result<Self> {
        Ok(TextSource::Topic {
            topic,
            passages: topic.passages()?,
            last: None,
        })
    }

    pub fn custom(label: impl Into<String>, text: impl Into<String>) -> Self {
        TextSource::Custom {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Read a UTF-8 text file, annotations allowed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let text = text.replace("\r\n", "\n").trim_end_matches('\n').to_string();
        if text.trim().is_empty() {
            return Err(Error::EmptyImport {
                path: path.to_path_buf(),
            });
        }
        info!(path = %path.display(), chars = text.chars().count(), "loaded practice text");
        Ok(Self::custom(file_label(path), text))
    }

    /// Import a `surface[,gloss]` vocabulary list.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        match csv_to_text(file)? {
            Some(text) => {
                info!(path = %path.display(), "imported csv practice text");
                Ok(Self::custom(file_label(path), text))
            }
            None => Err(Error::EmptyImport {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TextSource::Topic { topic, .. } => topic.to_string(),
            TextSource::Custom { label, .. } => label.clone(),
        }
    }

    /// Pick the next text. Topics never repeat the previous passage when they have a choice.
    pub fn next_text<R: Rng>(&mut self, rng: &mut R) -> String {
        match self {
            TextSource::Custom { text, .. } => text.clone(),
            TextSource::Topic { passages, last, .. } => {
                let index = match (*last, passages.len()) {
                    (_, 0) => return String::new(),
                    (_, 1) => 0,
                    (None, n) => rng.gen_range(0..n),
                    // skip over the previous pick
                    (Some(prev), n) => (prev + rng.gen_range(1..n)) % n,
                };
                debug!(index, "picked passage");
                *last = Some(index);
                passages[index].clone()
            }
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "custom".to_string())
}

/// Join CSV rows into annotated text. `None` when no row has a surface.
pub fn csv_to_text<R: Read>(reader: R) -> Result<Option<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut words = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let surface = record.get(0).unwrap_or_default();
        let gloss = record.get(1).unwrap_or_default();

        if index == 0 && surface.eq_ignore_ascii_case("surface") {
            continue;
        }
        if surface.is_empty() {
            continue;
        }
        if gloss.is_empty() {
            words.push(surface.to_string());
        } else {
            words.push(format!("[{surface}]({gloss})"));
        }
    }

    Ok((!words.is_empty()).then(|| words.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn every_topic_has_passages() {
        for topic in Topic::value_variants() {
            let passages = topic.passages().unwrap();
            assert!(passages.len() > 1, "{topic} should have several passages");
            assert!(passages.iter().all(|p| !p.trim().is_empty()));
        }
    }

    #[test]
    fn spanish_passages_carry_glosses() {
        let passages = Topic::Spanish.passages().unwrap();
        for passage in &passages {
            let segments = parser::parse(passage);
            assert!(segments.iter().any(|s| s.gloss.is_some()), "{passage}");
        }
    }

    #[test]
    fn code_passages_keep_indentation() {
        let passages = Topic::Code.passages().unwrap();
        assert!(passages.iter().any(|p| p.contains("\n    ")));
    }

    #[test]
    fn split_on_blank_lines() {
        let passages = split_passages("one\ntwo\n\n\nthree\r\n  \r\nfour  \n");
        assert_eq!(passages, vec!["one\ntwo", "three", "four"]);
    }

    #[test]
    fn topic_never_repeats_immediately() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut source = TextSource::topic(Topic::English).unwrap();
        let mut previous = source.next_text(&mut rng);
        for _ in 0..50 {
            let next = source.next_text(&mut rng);
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn single_passage_topic_repeats() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut source = TextSource::Topic {
            topic: Topic::English,
            passages: vec!["only".into()],
            last: None,
        };
        assert_eq!(source.next_text(&mut rng), "only");
        assert_eq!(source.next_text(&mut rng), "only");
    }

    #[test]
    fn custom_text_is_returned_verbatim() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut source = TextSource::custom("prompt", "[hi](hello) there");
        assert_eq!(source.label(), "prompt");
        assert_eq!(source.next_text(&mut rng), "[hi](hello) there");
    }

    #[test]
    fn file_source_trims_trailing_newlines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drill.txt");
        fs::write(&path, "line one\nline two\n\n").unwrap();

        let mut source = TextSource::from_file(&path).unwrap();
        assert_eq!(source.label(), "drill");
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(source.next_text(&mut rng), "line one\nline two");
    }

    #[test]
    fn empty_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "\n\n").unwrap();
        assert!(matches!(
            TextSource::from_file(&path),
            Err(Error::EmptyImport { .. })
        ));
    }

    #[test]
    fn csv_rows_become_annotations() {
        let data = "surface,gloss\nperro,dog\ngato, cat\nhola\n,orphan\n";
        let text = csv_to_text(data.as_bytes()).unwrap().unwrap();
        assert_eq!(text, "[perro](dog) [gato](cat) hola");
    }

    #[test]
    fn csv_without_header() {
        let text = csv_to_text("uno,one\ndos,two\n".as_bytes()).unwrap().unwrap();
        assert_eq!(text, "[uno](one) [dos](two)");
    }

    #[test]
    fn csv_import_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocab.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "surface,gloss").unwrap();
        writeln!(file, "casa,house").unwrap();
        drop(file);

        let source = TextSource::from_csv(&path).unwrap();
        assert_eq!(source, TextSource::custom("vocab", "[casa](house)"));
    }

    #[test]
    fn csv_with_only_header_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocab.csv");
        fs::write(&path, "surface,gloss\n").unwrap();
        assert!(matches!(
            TextSource::from_csv(&path),
            Err(Error::EmptyImport { .. })
        ));
    }
}
