//! 分片边界无关性的性质测试。
//!
//! # 教案级注释
//! - **核心目标 (Why)**：数据源以任意大小的分片投递文本，行序列必须只取决于字符流本身；
//!   `\r\n` 与 `\n` 必须产出相同的逻辑行。
//! - **设计手法 (How)**：Proptest 随机生成含多字节字符、`\r`、`\n` 的文本与切分点，
//!   与“整段一次性投递”以及独立编写的参考切分结果对比。
//! - **契约 (What)**：参考实现按 `\n` 切分、剥离每段末尾单个 `\r`，最后一段仅在非空时成行。

use futures::executor::block_on;
use proptest::prelude::*;
use proptest::sample::Index;
use spark_line_reader::{LineAssembler, MemorySource};

fn read_chunks(chunks: &[String]) -> Vec<String> {
    let (source, writer) = MemorySource::<()>::new();
    let reader = LineAssembler::new(source);
    writer.end_with(chunks.iter().cloned());

    let mut lines = Vec::new();
    while let Some(line) = block_on(reader.read_line()).expect("内存数据源不会出错") {
        lines.push(line);
    }
    lines
}

fn reference_lines(text: &str) -> Vec<String> {
    let chomp = |segment: &str| segment.strip_suffix('\r').unwrap_or(segment).to_owned();
    let mut segments: Vec<&str> = text.split('\n').collect();
    let tail = segments.pop().unwrap_or_default();
    let mut lines: Vec<String> = segments.into_iter().map(chomp).collect();
    if !tail.is_empty() {
        lines.push(chomp(tail));
    }
    lines
}

/// 按字符位置切分文本，保证每个分片都是合法 UTF-8。
fn split_at_chars(text: &str, cuts: &[Index]) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut points: Vec<usize> = cuts.iter().map(|cut| cut.index(chars.len() + 1)).collect();
    points.push(0);
    points.push(chars.len());
    points.sort_unstable();
    points.dedup();
    points
        .windows(2)
        .map(|pair| chars[pair[0]..pair[1]].iter().collect())
        .collect()
}

proptest! {
    #[test]
    fn lines_do_not_depend_on_chunk_boundaries(
        text in "[ab é中\r\n]{0,64}",
        cuts in prop::collection::vec(any::<Index>(), 0..12),
    ) {
        let chunks = split_at_chars(&text, &cuts);
        prop_assert_eq!(chunks.concat(), text.clone());

        let chunked = read_chunks(&chunks);
        prop_assert_eq!(&chunked, &read_chunks(&[text.clone()]));
        prop_assert_eq!(chunked, reference_lines(&text));
    }

    #[test]
    fn crlf_and_lf_produce_identical_lines(
        text in "[ab é\n]{0,48}",
        cuts in prop::collection::vec(any::<Index>(), 0..6),
    ) {
        let crlf = text.replace('\n', "\r\n");
        let lf_lines = read_chunks(&split_at_chars(&text, &cuts));
        let crlf_lines = read_chunks(&split_at_chars(&crlf, &cuts));
        prop_assert_eq!(lf_lines, crlf_lines);
    }

    #[test]
    fn lines_never_contain_line_terminators(text in "[a\r\n]{0,32}") {
        for line in read_chunks(&[text]) {
            prop_assert!(!line.contains('\n'));
        }
    }
}
