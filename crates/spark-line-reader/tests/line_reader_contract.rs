//! `line_reader_contract` 集成测试：从公开 API 视角验证逐行读取的核心契约。
//!
//! # 测试目标（Why）
//! - 覆盖行切分、`\r\n` 归一、无尾随换行、流结束标记等基本语义；
//! - 验证错误时序（缓冲行先于错误交付、错误粘滞）与并发读取拒绝；
//! - 覆盖 `skip` 与 `lines` 两个派生操作。
//!
//! # 结构安排（How）
//! - 以 [`MemorySource`] 模拟分片到达的数据源，`futures::executor::block_on` 驱动读取，
//!   不依赖任何异步运行时。

use futures::StreamExt;
use futures::executor::block_on;
use spark_line_reader::{LineAssembler, LineReaderError, MemorySource, MemoryWriter};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Ruh-roh!")]
struct RuhRoh;

type Reader = LineAssembler<MemorySource<RuhRoh>>;

fn reader() -> (Reader, MemoryWriter<RuhRoh>) {
    let (source, writer) = MemorySource::new();
    (LineAssembler::new(source), writer)
}

/// 读到流结束标记为止，返回全部行。
fn read_all(reader: &Reader) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(line) = block_on(reader.read_line()).expect("读取不应失败") {
        lines.push(line);
    }
    lines
}

#[test]
fn reads_a_stream_with_one_line() {
    let (reader, writer) = reader();
    writer.end_with(["This is a test\n"]);
    assert_eq!(read_all(&reader), ["This is a test"]);
}

#[test]
fn reads_multiple_lines_then_end_marker() {
    let (reader, writer) = reader();
    writer.end_with(["This is a test\n", "Testing\n", "Foo Bar Baz Bam\n"]);

    assert_eq!(block_on(reader.read_line()), Ok(Some("This is a test".to_owned())));
    assert_eq!(block_on(reader.read_line()), Ok(Some("Testing".to_owned())));
    assert_eq!(block_on(reader.read_line()), Ok(Some("Foo Bar Baz Bam".to_owned())));
    assert_eq!(block_on(reader.read_line()), Ok(None));
    assert_eq!(block_on(reader.read_line()), Ok(None), "结束标记应可重复观察");
}

#[test]
fn strips_carriage_return_before_terminator() {
    let (reader, writer) = reader();
    writer.end_with(["This is a test\r\n", "Testing\r\n"]);
    assert_eq!(read_all(&reader), ["This is a test", "Testing"]);
}

#[test]
fn delivers_trailing_partial_as_final_line() {
    let (reader, writer) = reader();
    writer.end_with(["This is a test\n", "Foo"]);
    assert_eq!(read_all(&reader), ["This is a test", "Foo"]);
}

#[test]
fn empty_stream_yields_end_marker_immediately() {
    let (reader, writer) = reader();
    writer.end();
    assert_eq!(block_on(reader.read_line()), Ok(None));
}

#[test]
fn blank_lines_are_preserved() {
    let (reader, writer) = reader();
    writer.end_with(["\n\r\nx\n\n"]);
    assert_eq!(read_all(&reader), ["", "", "x", ""]);
}

#[test]
fn pending_read_resolves_when_data_arrives_later() {
    let (reader, writer) = reader();
    let pending = reader.read_line();
    writer.write("par");
    writer.write("tial\nnext");
    assert_eq!(block_on(pending), Ok(Some("partial".to_owned())));

    let pending = reader.read_line();
    writer.end();
    assert_eq!(block_on(pending), Ok(Some("next".to_owned())));
    assert_eq!(block_on(reader.read_line()), Ok(None));
}

#[test]
fn rejects_with_source_error_after_buffered_lines() {
    let (reader, writer) = reader();
    writer.write("test\n");
    assert_eq!(block_on(reader.read_line()), Ok(Some("test".to_owned())));

    let pending = reader.read_line();
    writer.fail(RuhRoh);
    assert_eq!(block_on(pending), Err(LineReaderError::Source(RuhRoh)));
    assert_eq!(
        block_on(reader.read_line()),
        Err(LineReaderError::Source(RuhRoh)),
        "错误应粘滞"
    );
}

#[test]
fn lines_buffered_before_error_are_still_delivered_in_order() {
    let (reader, writer) = reader();
    writer.write("a\nb\nc\n");
    assert_eq!(block_on(reader.read_line()), Ok(Some("a".to_owned())));

    writer.fail(RuhRoh);
    writer.fail(RuhRoh);
    assert_eq!(block_on(reader.read_line()), Ok(Some("b".to_owned())));
    assert_eq!(block_on(reader.read_line()), Ok(Some("c".to_owned())));
    let err = block_on(reader.read_line()).expect_err("缓冲行耗尽后应得到数据源错误");
    assert_eq!(err.source_error(), Some(&RuhRoh));
    assert_eq!(err.to_string(), "Ruh-roh!");
}

#[test]
fn error_is_never_reported_as_end_of_stream() {
    let (reader, writer) = reader();
    writer.fail(RuhRoh);
    writer.end();
    assert_eq!(block_on(reader.read_line()), Err(LineReaderError::Source(RuhRoh)));
}

#[test]
fn rejects_concurrent_read_while_first_is_pending() {
    let (reader, writer) = reader();
    writer.end_with(["This is a test\n", "Testing\n", "Foo Bar Baz Bam"]);

    let first = reader.read_line();
    let second = block_on(reader.read_line());
    assert_eq!(second, Err(LineReaderError::ConcurrentRead));
    assert_eq!(block_on(first), Ok(Some("This is a test".to_owned())));
    assert_eq!(block_on(reader.read_line()), Ok(Some("Testing".to_owned())));
}

#[test]
fn concurrent_rejection_does_not_disturb_waiting_read() {
    let (reader, writer) = reader();
    let first = reader.read_line();
    let err = block_on(reader.read_line()).expect_err("在途请求存在时应拒绝");
    assert!(err.is_concurrent_read());

    writer.write("late line\n");
    assert_eq!(block_on(first), Ok(Some("late line".to_owned())));
}

#[test]
fn sequential_reads_after_completion_are_allowed() {
    let (reader, writer) = reader();
    writer.write("one\n");
    assert_eq!(block_on(reader.read_line()), Ok(Some("one".to_owned())));
    writer.write("two\n");
    assert_eq!(block_on(reader.read_line()), Ok(Some("two".to_owned())));
}

#[test]
fn skip_discards_requested_lines() {
    let (reader, writer) = reader();
    writer.end_with(["header\nsub-header\nrow 1\nrow 2\n"]);
    assert_eq!(block_on(reader.skip(2)), Ok(2));
    assert_eq!(read_all(&reader), ["row 1", "row 2"]);
}

#[test]
fn skip_past_end_returns_actual_count() {
    let (reader, writer) = reader();
    writer.end_with(["a\nb\n"]);
    assert_eq!(block_on(reader.skip(5)), Ok(2));
    assert_eq!(block_on(reader.read_line()), Ok(None));
}

#[test]
fn skip_zero_reads_nothing() {
    let (reader, writer) = reader();
    writer.end_with(["a\n"]);
    assert_eq!(block_on(reader.skip(0)), Ok(0));
    assert_eq!(writer.stats().resume_calls, 0);
}

#[test]
fn skip_propagates_source_error() {
    let (reader, writer) = reader();
    writer.write("a\n");
    writer.fail(RuhRoh);
    assert_eq!(block_on(reader.skip(3)), Err(LineReaderError::Source(RuhRoh)));
}

#[test]
fn lines_stream_ends_at_end_marker() {
    let (reader, writer) = reader();
    writer.end_with(["x\r\n", "y\nz"]);
    let lines: Vec<_> = block_on(reader.lines().collect());
    assert_eq!(
        lines,
        [Ok("x".to_owned()), Ok("y".to_owned()), Ok("z".to_owned())]
    );
}

#[test]
fn lines_stream_yields_error_once_then_stops() {
    let (reader, writer) = reader();
    writer.write("ok\n");
    let stream = reader.lines();
    futures::pin_mut!(stream);
    assert_eq!(block_on(stream.next()), Some(Ok("ok".to_owned())));

    writer.fail(RuhRoh);
    assert_eq!(
        block_on(stream.next()),
        Some(Err(LineReaderError::Source(RuhRoh)))
    );
    assert_eq!(block_on(stream.next()), None);
}
