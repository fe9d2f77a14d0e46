//! # 阶段 1：块识别
//!
//! 将原始文本按行分组为块（单行、花括号块），同时剔除注释。

use super::helpers::{find_unquoted, is_comment, keyword_rest, split_statements, strip_statement};

/// 以花括号开启块的关键字
const BLOCK_KEYWORDS: [&str; 3] = ["character", "style", "choice"];

/// 块类型（阶段 1 输出）
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// 单行内容（已去除首尾空白与行尾分号）
    SingleLine { line: String, line_number: usize },
    /// 花括号块
    Braced {
        /// `{` 之前的内容，如 `character chocola`
        header: String,
        /// 块内语句 (statement, line_number)
        body: Vec<(String, usize)>,
        start_line: usize,
        /// 是否遇到了 `}`
        closed: bool,
    },
}

impl Block {
    /// 获取块的起始行号
    #[cfg(test)]
    pub fn start_line(&self) -> usize {
        match self {
            Block::SingleLine { line_number, .. } => *line_number,
            Block::Braced { start_line, .. } => *start_line,
        }
    }
}

/// 正在收集的花括号块
struct OpenBlock {
    header: String,
    body: Vec<(String, usize)>,
    start_line: usize,
}

impl OpenBlock {
    fn push_fragment(&mut self, fragment: &str, line_number: usize) {
        let fragment = strip_statement(fragment);
        if fragment.is_empty() || is_comment(fragment) {
            return;
        }
        for statement in split_statements(fragment) {
            self.body.push((statement.to_string(), line_number));
        }
    }

    fn close(self, closed: bool) -> Block {
        Block::Braced {
            header: self.header,
            body: self.body,
            start_line: self.start_line,
            closed,
        }
    }
}

fn opens_block(line: &str) -> bool {
    is_block_keyword(line) && find_unquoted(line, '{').is_some()
}

fn is_block_keyword(line: &str) -> bool {
    BLOCK_KEYWORDS
        .iter()
        .any(|keyword| keyword_rest(line, keyword).is_some())
}

/// 从 `{` 之后的内容开始收集块
///
/// 同一行内闭合时直接放入 `blocks` 并返回 `None`，否则返回仍在收集的块。
fn begin_block(
    header: &str,
    after: &str,
    start_line: usize,
    line_number: usize,
    blocks: &mut Vec<Block>,
) -> Option<OpenBlock> {
    let mut block = OpenBlock {
        header: header.trim().to_string(),
        body: Vec::new(),
        start_line,
    };
    match find_unquoted(after, '}') {
        // 单行块：`style x { a: 1; b: 2 }`
        Some(close) => {
            block.push_fragment(&after[..close], line_number);
            blocks.push(block.close(true));
            None
        }
        None => {
            block.push_fragment(after, line_number);
            Some(block)
        }
    }
}

/// 识别文本中的块
pub fn recognize_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<OpenBlock> = None;
    // 等待下一行 `{` 的块头
    let mut pending_header: Option<(String, usize)> = None;
    let mut in_comment = false;

    for (line_idx, raw) in text.lines().enumerate() {
        let line_number = line_idx + 1;
        let trimmed = raw.trim();

        // 多行块注释
        if in_comment {
            if trimmed.contains("*/") {
                in_comment = false;
            }
            continue;
        }
        if trimmed.starts_with("/*") {
            in_comment = !trimmed[2..].contains("*/");
            continue;
        }
        if trimmed.starts_with("//") {
            continue;
        }

        // 块内行
        if let Some(block) = current.as_mut() {
            match find_unquoted(trimmed, '}') {
                Some(close) => {
                    block.push_fragment(&trimmed[..close], line_number);
                    if let Some(block) = current.take() {
                        blocks.push(block.close(true));
                    }
                }
                None => block.push_fragment(trimmed, line_number),
            }
            continue;
        }

        let line = strip_statement(trimmed);
        if line.is_empty() {
            continue;
        }

        if let Some((header, start_line)) = pending_header.take() {
            if let Some(after) = line.strip_prefix('{') {
                current = begin_block(&header, after, start_line, line_number, &mut blocks);
                continue;
            }
            blocks.push(Block::SingleLine {
                line: header,
                line_number: start_line,
            });
        }

        if opens_block(line)
            && let Some(open) = find_unquoted(line, '{')
        {
            current = begin_block(
                &line[..open],
                &line[open + 1..],
                line_number,
                line_number,
                &mut blocks,
            );
            continue;
        }

        // `character chocola` 换行后再写 `{`
        if is_block_keyword(line) {
            pending_header = Some((line.to_string(), line_number));
            continue;
        }

        blocks.push(Block::SingleLine {
            line: line.to_string(),
            line_number,
        });
    }

    // 没等到 `{` 的块头按普通行交给阶段 2
    if let Some((header, start_line)) = pending_header {
        blocks.push(Block::SingleLine {
            line: header,
            line_number: start_line,
        });
    }
    // 未闭合的块仍然交给阶段 2，由其记录警告
    if let Some(block) = current {
        blocks.push(block.close(false));
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_lines_and_comments() {
        let text = "// header\nscene bg room;\n\n/* note */\nsay(\"hi\")\n";
        let blocks = recognize_blocks(text);
        assert_eq!(
            blocks,
            vec![
                Block::SingleLine {
                    line: "scene bg room".to_string(),
                    line_number: 2
                },
                Block::SingleLine {
                    line: "say(\"hi\")".to_string(),
                    line_number: 5
                },
            ]
        );
    }

    #[test]
    fn test_multi_line_comment_is_skipped() {
        let text = "/*\nscene bg room\n*/\nend";
        let blocks = recognize_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line(), 4);
    }

    #[test]
    fn test_multi_line_braced_block() {
        let text = "character chocola {\n  display_name: \"Chocola\";\n  // 注释\n  name_color: 0xFF69B4;\n}\n";
        let blocks = recognize_blocks(text);
        assert_eq!(
            blocks,
            vec![Block::Braced {
                header: "character chocola".to_string(),
                body: vec![
                    ("display_name: \"Chocola\"".to_string(), 2),
                    ("name_color: 0xFF69B4".to_string(), 4),
                ],
                start_line: 1,
                closed: true,
            }]
        );
    }

    #[test]
    fn test_single_line_braced_block() {
        let blocks = recognize_blocks("style dialog { font_size: 24; color: white }");
        match &blocks[0] {
            Block::Braced { header, body, .. } => {
                assert_eq!(header, "style dialog");
                assert_eq!(body.len(), 2);
                assert_eq!(body[1].0, "color: white");
            }
            other => panic!("期望花括号块，实际 {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_block() {
        let blocks = recognize_blocks("choice {\n\"A\" -> a\n");
        match &blocks[0] {
            Block::Braced { closed, body, .. } => {
                assert!(!closed);
                assert_eq!(body.len(), 1);
            }
            other => panic!("期望花括号块，实际 {:?}", other),
        }
    }

    #[test]
    fn test_brace_on_next_line() {
        let text = "character chocola\n// 注释\n{\n  display_name: \"Chocola\"\n}\nend";
        let blocks = recognize_blocks(text);
        assert_eq!(
            blocks,
            vec![
                Block::Braced {
                    header: "character chocola".to_string(),
                    body: vec![("display_name: \"Chocola\"".to_string(), 4)],
                    start_line: 1,
                    closed: true,
                },
                Block::SingleLine {
                    line: "end".to_string(),
                    line_number: 6
                },
            ]
        );
    }

    #[test]
    fn test_header_without_brace_stays_single_line() {
        let blocks = recognize_blocks("choice\nsay(\"hi\")\nstyle");
        let lines: Vec<usize> = blocks.iter().map(Block::start_line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(
            blocks
                .iter()
                .all(|block| matches!(block, Block::SingleLine { .. }))
        );
    }

    #[test]
    fn test_brace_inside_quotes_does_not_open_block() {
        let blocks = recognize_blocks("say(\"choice { is not a block\")");
        assert!(matches!(blocks[0], Block::SingleLine { .. }));
    }
}
