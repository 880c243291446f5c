//! Offline ingestion: transcript → argument units → JSON record → Qdrant point.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use crc32fast::Hasher as Crc32;
use regex::Regex;
use tracing::{info, warn};

use crate::embedder::Embedder;
use crate::generator::Generator;
use crate::unit::Unit;
use crate::vector_store::UnitSink;

/// Title used when no lecture heading is detected.
pub const UNKNOWN_LECTURE: &str = "Unknown Lecture";

/// Title and class number detected in a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureInfo {
    /// Heading text, e.g. `Brihadaranyaka Upanishad Class 3`.
    pub title: String,
    /// Class number, or a `YYYYMMDD_HHMM` stamp when none was found.
    pub class_num: String,
}

fn lecture_heading() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(Brihad.*?Class\s*(\d+))").expect("lecture heading pattern compiles")
    })
}

fn unsafe_title_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("title pattern compiles"))
}

/// Finds the `Brihad… Class N` heading in a transcript.
pub fn detect_lecture_info(text: &str) -> Option<LectureInfo> {
    let caps = lecture_heading().captures(text)?;
    Some(LectureInfo {
        title: caps.get(1)?.as_str().trim().to_string(),
        class_num: caps.get(2)?.as_str().trim().to_string(),
    })
}

/// Like [`detect_lecture_info`], falling back to an unknown title stamped
/// with the current local time.
pub fn lecture_info_or_fallback(text: &str) -> LectureInfo {
    detect_lecture_info(text).unwrap_or_else(|| LectureInfo {
        title: UNKNOWN_LECTURE.to_string(),
        class_num: chrono::Local::now().format("%Y%m%d_%H%M").to_string(),
    })
}

/// File name for a lecture record, e.g. `class_3_Brihadaranyaka_Class_3.json`.
pub fn record_file_name(info: &LectureInfo) -> String {
    let safe_title = unsafe_title_chars().replace_all(&info.title, "_");
    format!("class_{}_{}.json", info.class_num, safe_title)
}

/// Stable point id for a lecture, so re-ingesting replaces the old point.
pub fn point_id(unit: &Unit) -> u64 {
    let mut hasher = Crc32::new();
    hasher.update(unit.class_num.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(unit.title.as_bytes());
    u64::from(hasher.finalize())
}

/// Prompt asking the generator to segment a transcript into argument units.
pub fn segmentation_prompt(transcript: &str) -> String {
    let mut prompt = String::from(
        "You are a Vedānta discourse analyst working on Swami Paramananda Giri's \
         Jyotir Brāhmaṇa lectures.\n\n\
         Segment the following lecture transcript into *argument-units*.\n\
         Each unit must have:\n\n\
         - **Topic**\n\
         - **Śabda Pivot**  (key word or linguistic hinge)\n\
         - **Pūrvapakṣa**   (misunderstanding or opposing stance)\n\
         - **Siddhānta**    (resolution or intended meaning)\n\
         - **Quotation**    (if present)\n\
         - **Layer**        one of: Śruti | Bhāṣya | Vārttika | Ṭīkā | Footnote | Modern exposition\n\
         - **Expands**      which prior layer it elaborates (e.g. Bhāṣya expands Śruti)\n\
         - **Function**     short phrase for the interpretive role, such as \
         \"makes explicit what was implicit\", \"clarifies hidden assumption\", \
         \"illustrates with example\"\n\n\
         Detect layers from textual cues:\n\
         - Mentions of Śaṅkara or \"in the Bhāṣya\" → Layer = Bhāṣya, Expands = Śruti.\n\
         - Mentions of Sureśvara or \"in the Vārttika\" → Layer = Vārttika, Expands = Bhāṣya.\n\
         - Mentions of the Ṭīkākāra or \"in the Ṭīkā\" → Layer = Ṭīkā, Expands = Vārttika or Bhāṣya.\n\
         - Explicit quotations from the Upaniṣad → Layer = Śruti.\n\
         - The lecturer's own clarifying explanation → Layer = Modern exposition, Expands = preceding layer.\n\n\
         If no layer is clear, leave those three fields blank.\n\n\
         Keep the writing in readable Markdown, with clear numbering and spacing.\n\
         Preserve exact Sanskrit words in IAST where present.\n\n\
         Lecture text:\n",
    );
    prompt.push_str(transcript);
    prompt.push('\n');
    prompt
}

/// What one ingestion run produced.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// The saved record.
    pub unit: Unit,
    /// Where the record was written.
    pub record_path: PathBuf,
    /// Point id used for the upsert, if uploaded.
    pub point_id: Option<u64>,
}

/// Embeds records and writes them to a collection.
pub struct Uploader<'a> {
    /// Embeds record content.
    pub embedder: &'a dyn Embedder,
    /// Destination collection.
    pub sink: &'a dyn UnitSink,
}

impl Uploader<'_> {
    /// Embeds a record and upserts it under its stable id; blank content is
    /// skipped without calling the embedder.
    pub fn upload(&self, unit: &Unit) -> Result<Option<u64>> {
        if unit.content.trim().is_empty() {
            warn!(title = %unit.title, "record has no content; skipping upload");
            return Ok(None);
        }
        let vector = self
            .embedder
            .embed(&unit.content)
            .context("failed to embed record")?;
        let collection = self.sink.collection();
        if self.sink.ensure_collection(vector.len())? {
            info!(collection, dim = vector.len(), "created collection");
        }
        let id = point_id(unit);
        self.sink.upsert(id, vector, unit.to_payload())?;
        info!(title = %unit.title, id, collection, "uploaded record");
        Ok(Some(id))
    }
}

/// Collaborators for one ingestion run.
pub struct Ingestor<'a> {
    /// Segments transcripts into argument units.
    pub generator: &'a dyn Generator,
    /// Upload target; `None` only writes the record.
    pub uploader: Option<Uploader<'a>>,
}

impl Ingestor<'_> {
    /// Reads a transcript, segments it, writes the record under `output_dir`
    /// and uploads its embedding.
    pub fn ingest_file(&self, input: &Path, output_dir: &Path) -> Result<IngestReport> {
        let transcript = fs::read_to_string(input)
            .with_context(|| format!("failed to read transcript {:?}", input))?;
        info!(path = ?input, "processing transcript");
        let info = lecture_info_or_fallback(&transcript);
        info!(title = %info.title, class_num = %info.class_num, "detected lecture");

        info!("generating structured argument units");
        let structured = self
            .generator
            .generate(&segmentation_prompt(&transcript))
            .context("failed to segment transcript")?;
        let unit = Unit::new(info.title.clone(), info.class_num.clone(), structured.trim());

        let record_path = write_record(&unit, &info, output_dir)?;
        info!(path = ?record_path, "saved structured record");

        let point_id = match &self.uploader {
            Some(uploader) => uploader.upload(&unit)?,
            None => None,
        };
        Ok(IngestReport {
            unit,
            record_path,
            point_id,
        })
    }
}

/// Writes the lecture record as pretty JSON.
pub fn write_record(unit: &Unit, info: &LectureInfo, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {:?}", output_dir))?;
    let path = output_dir.join(record_file_name(info));
    let json = serde_json::to_string_pretty(unit).context("failed to serialize record")?;
    fs::write(&path, json).with_context(|| format!("failed to write {:?}", path))?;
    Ok(path)
}

/// Loads a previously written lecture record.
pub fn read_record(path: &Path) -> Result<Unit> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read record {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid lecture record {:?}", path))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{Map, Value};

    use super::*;

    struct FixedEmbedder {
        calls: Mutex<usize>,
    }

    impl FixedEmbedder {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl Embedder for FixedEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            *self.calls.lock().unwrap() += 1;
            Ok(vec![0.25, 0.5, 0.75])
        }
    }

    struct EchoGenerator(&'static str);

    impl Generator for EchoGenerator {
        fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        exists: Mutex<bool>,
        created: Mutex<Vec<usize>>,
        points: Mutex<Vec<(u64, Vec<f32>, Map<String, Value>)>>,
    }

    impl RecordingSink {
        fn existing() -> Self {
            Self {
                exists: Mutex::new(true),
                ..Self::default()
            }
        }
    }

    impl UnitSink for RecordingSink {
        fn collection(&self) -> &str {
            "test_units"
        }

        fn ensure_collection(&self, vector_size: usize) -> Result<bool> {
            let mut exists = self.exists.lock().unwrap();
            if *exists {
                return Ok(false);
            }
            self.created.lock().unwrap().push(vector_size);
            *exists = true;
            Ok(true)
        }

        fn upsert(&self, id: u64, vector: Vec<f32>, payload: Map<String, Value>) -> Result<()> {
            self.points.lock().unwrap().push((id, vector, payload));
            Ok(())
        }
    }

    #[test]
    fn detects_heading_case_insensitively() {
        let text = "Om. brihadaranyaka upanishad jyotir brahmana class 3\nToday we continue.";
        let info = detect_lecture_info(text).expect("heading");
        assert_eq!(info.title, "brihadaranyaka upanishad jyotir brahmana class 3");
        assert_eq!(info.class_num, "3");
    }

    #[test]
    fn heading_stops_at_first_class_number() {
        let text = "Brihadaranyaka Class 12 recap of Class 11";
        let info = detect_lecture_info(text).expect("heading");
        assert_eq!(info.title, "Brihadaranyaka Class 12");
        assert_eq!(info.class_num, "12");
    }

    #[test]
    fn missing_heading_falls_back_to_timestamp() {
        let info = lecture_info_or_fallback("no heading here");
        assert_eq!(info.title, UNKNOWN_LECTURE);
        assert_eq!(info.class_num.len(), "YYYYMMDD_HHMM".len());
        assert!(info.class_num.contains('_'));
    }

    #[test]
    fn record_names_are_filesystem_safe() {
        let info = LectureInfo {
            title: "Bṛhad – Class 3".to_string(),
            class_num: "3".to_string(),
        };
        assert_eq!(record_file_name(&info), "class_3_B_had_Class_3.json");
    }

    #[test]
    fn point_ids_are_stable_per_lecture() {
        let a = Unit::new("Talk1", "3", "first version");
        let b = Unit::new("Talk1", "3", "second version");
        let c = Unit::new("Talk1", "4", "first version");
        assert_eq!(point_id(&a), point_id(&b));
        assert_ne!(point_id(&a), point_id(&c));
    }

    #[test]
    fn segmentation_prompt_embeds_transcript() {
        let prompt = segmentation_prompt("kim jyotir ayam puruṣaḥ");
        assert!(prompt.contains("argument-units"));
        assert!(prompt.ends_with("Lecture text:\nkim jyotir ayam puruṣaḥ\n"));
    }

    #[test]
    fn records_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let info = LectureInfo {
            title: "Brihad Class 3".to_string(),
            class_num: "3".to_string(),
        };
        let unit = Unit::new(info.title.clone(), "3", "## Unit 1\n**Topic**: jyotiḥ");
        let path = write_record(&unit, &info, &dir.path().join("Data")).unwrap();
        assert!(path.ends_with("class_3_Brihad_Class_3.json"));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("jyotiḥ"), "non-ASCII text is kept as-is");
        assert_eq!(read_record(&path).unwrap(), unit);
    }

    #[test]
    fn blank_records_are_not_embedded_or_uploaded() {
        let embedder = FixedEmbedder::new();
        let sink = RecordingSink::default();
        let uploader = Uploader {
            embedder: &embedder,
            sink: &sink,
        };
        let id = uploader.upload(&Unit::new("Talk1", "3", "  \n ")).unwrap();
        assert_eq!(id, None);
        assert_eq!(embedder.calls(), 0);
        assert!(sink.created.lock().unwrap().is_empty());
        assert!(sink.points.lock().unwrap().is_empty());
    }

    #[test]
    fn upload_creates_missing_collection_once_and_upserts_payload() {
        let embedder = FixedEmbedder::new();
        let sink = RecordingSink::default();
        let uploader = Uploader {
            embedder: &embedder,
            sink: &sink,
        };
        let first = Unit::new("Talk1", "3", "the self is light");
        let second = Unit::new("Talk1", "3", "the self is light, revised");

        let id = uploader.upload(&first).unwrap();
        let again = uploader.upload(&second).unwrap();

        assert_eq!(id, Some(point_id(&first)));
        assert_eq!(again, id, "re-ingesting a lecture reuses its point id");
        assert_eq!(*sink.created.lock().unwrap(), vec![3]);
        let points = sink.points.lock().unwrap();
        assert_eq!(points.len(), 2);
        let (stored_id, vector, payload) = &points[1];
        assert_eq!(Some(*stored_id), id);
        assert_eq!(vector, &vec![0.25, 0.5, 0.75]);
        assert_eq!(payload["title"], "Talk1");
        assert_eq!(payload["class_num"], "3");
        assert_eq!(payload["content"], "the self is light, revised");
    }

    #[test]
    fn existing_collection_is_never_recreated() {
        let embedder = FixedEmbedder::new();
        let sink = RecordingSink::existing();
        let uploader = Uploader {
            embedder: &embedder,
            sink: &sink,
        };
        uploader.upload(&Unit::new("Talk2", "4", "seer")).unwrap();
        assert!(sink.created.lock().unwrap().is_empty());
        assert_eq!(sink.points.lock().unwrap().len(), 1);
    }

    #[test]
    fn ingest_file_writes_record_then_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pasted.txt");
        fs::write(&input, "Brihadaranyaka Upanishad Class 7\nkim jyotir ayam puruṣaḥ").unwrap();
        let generator = EchoGenerator("  ## Unit 1\n**Topic**: ātman  ");
        let embedder = FixedEmbedder::new();
        let sink = RecordingSink::default();
        let ingestor = Ingestor {
            generator: &generator,
            uploader: Some(Uploader {
                embedder: &embedder,
                sink: &sink,
            }),
        };

        let report = ingestor.ingest_file(&input, &dir.path().join("Data")).unwrap();

        assert_eq!(report.unit.class_num, "7");
        assert_eq!(report.unit.content, "## Unit 1\n**Topic**: ātman");
        assert_eq!(read_record(&report.record_path).unwrap(), report.unit);
        assert_eq!(report.point_id, Some(point_id(&report.unit)));
        assert_eq!(sink.points.lock().unwrap().len(), 1);
    }

    #[test]
    fn ingest_without_uploader_only_writes_record() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pasted.txt");
        fs::write(&input, "Brihadaranyaka Class 2 transcript").unwrap();
        let generator = EchoGenerator("units");
        let ingestor = Ingestor {
            generator: &generator,
            uploader: None,
        };
        let report = ingestor.ingest_file(&input, dir.path()).unwrap();
        assert_eq!(report.point_id, None);
        assert!(report.record_path.exists());
    }
}
