//! Test doubles and the seed catalog shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::completion::CompletionService;
use crate::embeddings::{Embedder, TextRole, course_passage, lesson_passage};
use crate::error::{CompletionError, RagError};
use crate::store::{IndexedRecord, MemoryIndex, SearchFilter, VectorIndex};
use crate::types::{CourseRecord, Hit, Scope};

pub fn course_record(course_id: &str, title: &str, content: &str) -> CourseRecord {
    CourseRecord {
        id: format!("rec-{course_id}"),
        record_type: Scope::Course,
        course_id: course_id.to_string(),
        course_title: title.to_string(),
        lesson_id: String::new(),
        lesson_title: String::new(),
        author: "Trần Huy".to_string(),
        category: "Lập trình".to_string(),
        content: content.to_string(),
        url: format!("https://example.com/{}", course_id.to_lowercase()),
    }
}

pub fn lesson_record(lesson_id: &str, course_id: &str, title: &str, content: &str) -> CourseRecord {
    CourseRecord {
        id: format!("rec-{lesson_id}"),
        record_type: Scope::Lesson,
        course_id: course_id.to_string(),
        course_title: format!("Course {course_id}"),
        lesson_id: lesson_id.to_string(),
        lesson_title: title.to_string(),
        author: "Trần Huy".to_string(),
        category: "Lập trình".to_string(),
        content: content.to_string(),
        url: format!("https://example.com/{}", course_id.to_lowercase()),
    }
}

pub fn hit(record: CourseRecord, score: f32) -> Hit {
    Hit { record, score }
}

/// Bag-of-keywords embedder: one dimension per vocabulary term.
///
/// Texts sharing no vocabulary get orthogonal (or zero) vectors, so cosine
/// scores are predictable in tests.
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    roles: Mutex<Vec<TextRole>>,
}

const VOCABULARY: [&str; 8] = [
    "python",
    "seo",
    "từ khóa",
    "backlink",
    "onpage",
    "biến",
    "lập trình",
    "marketing",
];

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            roles: Mutex::new(Vec::new()),
        }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|term| lower.matches(term).count() as f32)
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn roles(&self) -> Vec<TextRole> {
        self.roles.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str, role: TextRole) -> Result<Vec<f32>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.roles.lock().unwrap().push(role);
        Ok(Self::vector(text))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        role: TextRole,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, role).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str, _role: TextRole) -> Result<Vec<f32>, RagError> {
        Err(RagError::Embedding("model server unreachable".to_string()))
    }

    async fn embed_batch(
        &self,
        _texts: &[String],
        _role: TextRole,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        Err(RagError::Embedding("model server unreachable".to_string()))
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Index that fails every search, as an unreachable backend would.
pub struct FailingIndex {
    pub dims: usize,
}

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn search(
        &self,
        _query_embedding: &[f32],
        _filter: &SearchFilter,
        _limit: usize,
    ) -> Result<Vec<Hit>, RagError> {
        Err(RagError::Index("connection refused".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Index that returns a fixed hit list regardless of filter.
pub struct FixedIndex {
    pub dims: usize,
    pub hits: Vec<Hit>,
    pub searches: AtomicUsize,
}

impl FixedIndex {
    pub fn new(dims: usize, hits: Vec<Hit>) -> Self {
        Self {
            dims,
            hits,
            searches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VectorIndex for FixedIndex {
    async fn search(
        &self,
        _query_embedding: &[f32],
        _filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<Hit>, RagError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Completion service that records prompts and replies from a script.
pub struct ScriptedCompletion {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(CompletionError::ApiError {
                status: 503,
                message: message.clone(),
            }),
        }
    }
}

/// The two-course sample catalog, embedded with [`KeywordEmbedder`].
pub fn seed_catalog() -> MemoryIndex {
    struct Lesson(&'static str, &'static str, &'static str);
    struct Course {
        id: &'static str,
        title: &'static str,
        author: &'static str,
        category: &'static str,
        description: &'static str,
        url: &'static str,
        lessons: Vec<Lesson>,
    }

    let courses = vec![
        Course {
            id: "C001",
            title: "Khóa học SEO nâng cao",
            author: "Nguyễn Minh",
            category: "Marketing",
            description: "Khóa học giúp bạn tối ưu SEO website, nghiên cứu từ khóa và xây dựng nội dung chất lượng.",
            url: "https://example.com/seo-nang-cao",
            lessons: vec![
                Lesson("L001", "Nghiên cứu từ khóa", "Cách phân tích và chọn từ khóa phù hợp."),
                Lesson("L002", "Tối ưu Onpage", "Kỹ thuật tối ưu tiêu đề, meta và heading."),
                Lesson("L003", "Xây dựng backlink", "Phương pháp tạo liên kết chất lượng cao."),
            ],
        },
        Course {
            id: "C002",
            title: "Khóa học Lập trình Python cơ bản",
            author: "Trần Huy",
            category: "Lập trình",
            description: "Học Python từ căn bản đến nâng cao, qua ví dụ thực tế và bài tập ứng dụng.",
            url: "https://example.com/python-co-ban",
            lessons: vec![
                Lesson("L004", "Giới thiệu Python", "Lịch sử và ứng dụng thực tế của Python."),
                Lesson("L005", "Biến và kiểu dữ liệu", "Cách khai báo và sử dụng biến trong Python."),
            ],
        },
    ];

    let mut records = Vec::new();
    for course in &courses {
        records.push(IndexedRecord {
            record: CourseRecord {
                id: format!("rec-{}", course.id),
                record_type: Scope::Course,
                course_id: course.id.to_string(),
                course_title: course.title.to_string(),
                lesson_id: String::new(),
                lesson_title: String::new(),
                author: course.author.to_string(),
                category: course.category.to_string(),
                content: course.description.to_string(),
                url: course.url.to_string(),
            },
            embedding: KeywordEmbedder::vector(&course_passage(
                course.title,
                course.author,
                course.category,
                course.description,
            )),
        });
        for Lesson(lesson_id, title, content) in &course.lessons {
            records.push(IndexedRecord {
                record: CourseRecord {
                    id: format!("rec-{lesson_id}"),
                    record_type: Scope::Lesson,
                    course_id: course.id.to_string(),
                    course_title: course.title.to_string(),
                    lesson_id: lesson_id.to_string(),
                    lesson_title: title.to_string(),
                    author: course.author.to_string(),
                    category: course.category.to_string(),
                    content: content.to_string(),
                    url: course.url.to_string(),
                },
                embedding: KeywordEmbedder::vector(&lesson_passage(
                    title,
                    course.title,
                    course.author,
                    content,
                )),
            });
        }
    }

    MemoryIndex::new(VOCABULARY.len(), records).unwrap()
}
