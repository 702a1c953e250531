//! Passage builders for catalog records.
//!
//! These are the texts an indexer embeds for each record type. Queries are
//! compared against these vectors, so the wording here determines what a
//! question has to resemble to score well.

/// Build the embeddable text for a course record.
pub fn course_passage(title: &str, author: &str, category: &str, description: &str) -> String {
    format!("Khóa học: {title}. Tác giả: {author}. Danh mục: {category}. Nội dung: {description}")
}

/// Build the embeddable text for a lesson record.
pub fn lesson_passage(
    lesson_title: &str,
    course_title: &str,
    author: &str,
    content: &str,
) -> String {
    format!(
        "Bài học: {lesson_title}. Thuộc khóa học: {course_title}. Tác giả: {author}. Nội dung: {content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_passage() {
        let text = course_passage(
            "Khóa học SEO nâng cao",
            "Nguyễn Minh",
            "Marketing",
            "Tối ưu SEO website.",
        );
        assert!(text.starts_with("Khóa học: Khóa học SEO nâng cao."));
        assert!(text.contains("Tác giả: Nguyễn Minh"));
        assert!(text.contains("Danh mục: Marketing"));
    }

    #[test]
    fn test_lesson_passage_names_parent_course() {
        let text = lesson_passage(
            "Giới thiệu Python",
            "Khóa học Lập trình Python cơ bản",
            "Trần Huy",
            "Lịch sử và ứng dụng thực tế của Python.",
        );
        assert!(text.starts_with("Bài học: Giới thiệu Python."));
        assert!(text.contains("Thuộc khóa học: Khóa học Lập trình Python cơ bản"));
    }
}
