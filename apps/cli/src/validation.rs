//! 输入解析

use anyhow::{Context, Result};

/// 解析逗号分隔的 6 个整数，例如 `0,10000,-20000,0,0,0`
pub fn parse_six(text: &str, what: &str) -> Result<[i32; 6]> {
    let values: Vec<i32> = text
        .split(',')
        .map(|s| s.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("解析{}失败: {}", what, text))?;

    values
        .try_into()
        .map_err(|v: Vec<i32>| anyhow::anyhow!("{}需要 6 个值，实际 {} 个", what, v.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six() {
        assert_eq!(
            parse_six("0, 10000,-20000,0,0,0", "关节").unwrap(),
            [0, 10000, -20000, 0, 0, 0]
        );
    }

    #[test]
    fn test_parse_six_wrong_count() {
        let err = parse_six("1,2,3", "关节").unwrap_err();
        assert!(err.to_string().contains("6"));
    }

    #[test]
    fn test_parse_six_not_a_number() {
        assert!(parse_six("1,2,x,4,5,6", "位姿").is_err());
        assert!(parse_six("1.5,2,3,4,5,6", "位姿").is_err());
    }
}
