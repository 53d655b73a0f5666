//! 字节到文本的流式解码。
//!
//! 字节流按任意边界分片到达，多字节序列可能被切断在两个分片之间；
//! [`TextDecoder`] 在内部保留未完成的序列，直到后续字节补齐或流结束。

use encoding_rs::{CoderResult, Decoder, UTF_16LE, UTF_8};
use spark_line_reader::TextEncoding;

/// 带状态的增量解码器。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `utf8` 与 `utf16le`/`ucs2` 走 `encoding_rs` 流式解码，非法序列替换为 U+FFFD；
///   - `latin1` 将每个字节映射为同值码点；
///   - `ascii` 丢弃每个字节的最高位；
///   - [`TextDecoder::finish`] 之后解码器不再产出文本；
/// - **权衡 (Trade-offs)**：不处理 BOM，字节流开头的 BOM 会作为 U+FEFF 出现在首行。
pub struct TextDecoder {
    encoding: TextEncoding,
    kind: DecoderKind,
}

enum DecoderKind {
    Streaming(Option<Decoder>),
    Latin1,
    Ascii,
}

impl TextDecoder {
    /// 为指定编码创建解码器。
    pub fn new(encoding: TextEncoding) -> Self {
        let kind = match encoding {
            TextEncoding::Utf8 => {
                DecoderKind::Streaming(Some(UTF_8.new_decoder_without_bom_handling()))
            }
            TextEncoding::Utf16Le | TextEncoding::Ucs2 => {
                DecoderKind::Streaming(Some(UTF_16LE.new_decoder_without_bom_handling()))
            }
            TextEncoding::Latin1 => DecoderKind::Latin1,
            TextEncoding::Ascii => DecoderKind::Ascii,
        };
        Self { encoding, kind }
    }

    /// 当前解码方案。
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// 解码一个分片，返回其中可确定的文本；未完成的多字节序列留待下次。
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        match &mut self.kind {
            DecoderKind::Streaming(Some(decoder)) => stream_decode(decoder, bytes, false),
            DecoderKind::Streaming(None) => String::new(),
            DecoderKind::Latin1 => bytes.iter().map(|&byte| char::from(byte)).collect(),
            DecoderKind::Ascii => bytes.iter().map(|&byte| char::from(byte & 0x7f)).collect(),
        }
    }

    /// 流结束：冲刷残余字节，未完成的序列替换为 U+FFFD。
    pub fn finish(&mut self) -> String {
        match &mut self.kind {
            DecoderKind::Streaming(slot) => match slot.take() {
                Some(mut decoder) => stream_decode(&mut decoder, &[], true),
                None => String::new(),
            },
            DecoderKind::Latin1 | DecoderKind::Ascii => String::new(),
        }
    }
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

fn stream_decode(decoder: &mut Decoder, mut bytes: &[u8], last: bool) -> String {
    let mut out = String::new();
    loop {
        let needed = decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len().saturating_mul(3).saturating_add(4));
        out.reserve(needed);
        let (result, read, _replaced) = decoder.decode_to_string(bytes, &mut out, last);
        bytes = &bytes[read..];
        match result {
            CoderResult::InputEmpty => return out,
            CoderResult::OutputFull => continue,
        }
    }
}
