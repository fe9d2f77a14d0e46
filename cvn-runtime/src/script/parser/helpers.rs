//! # 辅助解析函数
//!
//! 手写的字符串解析辅助函数，无正则依赖。

use std::time::Duration;

/// 去除首尾空白与行尾分号
///
/// 输入: `  scene bg room;;  `
/// 输出: `scene bg room`
pub fn strip_statement(s: &str) -> &str {
    s.trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// 是否为单行注释或块注释起始行
pub fn is_comment(s: &str) -> bool {
    s.starts_with("//") || s.starts_with("/*")
}

/// 匹配关键字并返回其后的内容
///
/// 关键字后必须是空白或行尾，`showtime` 不会匹配 `show`。
///
/// 输入: `"jump ending"`, `"jump"`
/// 输出: `Some("ending")`
pub fn keyword_rest<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(keyword)?;
    if rest.is_empty() {
        return Some(rest);
    }
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// 是否为合法标识符（字母、数字、下划线、短横线，不以数字开头）
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// 在引号之外按分号拆分语句
///
/// 输入: `display_name: "A;B"; voice_tag: "v"`
/// 输出: `["display_name: \"A;B\"", "voice_tag: \"v\""]`
pub fn split_statements(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// 查找引号之外第一次出现的字符
pub fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == target && !in_quotes {
            return Some(i);
        }
    }
    None
}

/// 解析开头的双引号字符串
///
/// 输入: `"Hello" -> next`
/// 输出: `Some(("Hello", " -> next"))`
pub fn parse_quoted(s: &str) -> Option<(&str, &str)> {
    let inner = s.trim_start().strip_prefix('"')?;
    let end = inner.find('"')?;
    Some((&inner[..end], &inner[end + 1..]))
}

/// 去掉两侧的双引号（如果有）
pub fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// 拆分 `key: value`
///
/// 冒号在引号内时不作为分隔符。
pub fn parse_field(s: &str) -> Option<(&str, &str)> {
    let pos = find_unquoted(s, ':')?;
    let key = s[..pos].trim();
    let value = s[pos + 1..].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// 解析十六进制颜色
///
/// 支持 `0xRRGGBB`、`#RRGGBB` 以及不带前缀的写法。
pub fn parse_hex_color(s: &str) -> Option<u32> {
    let s = unquote(s);
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('#'))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// 解析整数
pub fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// 解析时长
///
/// 纯数字按毫秒处理；支持 `ms` 与 `s` 后缀。
///
/// 输入: `"500"` / `"500ms"` / `"1.5s"`
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(secs) = s.strip_suffix('s') {
        let secs: f64 = secs.trim().parse().ok()?;
        // 负数、NaN 与超出 Duration 表示范围的值都视为无效
        return Duration::try_from_secs_f64(secs).ok();
    }
    s.parse::<u64>().ok().map(Duration::from_millis)
}

/// 解析相等条件 `<var> == <int>`
pub fn parse_equality(s: &str) -> Option<(&str, i64)> {
    let (var, value) = s.split_once("==")?;
    let var = var.trim();
    if !is_identifier(var) {
        return None;
    }
    Some((var, parse_int(value)?))
}
