use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads the `data` payloads of server-sent events from a chunk stream.
///
/// Only the subset OpenAI-compatible servers emit is understood: `data`
/// fields (joined with `\n` when repeated), comment lines, and other named
/// fields, which are skipped.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
    eof: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            eof: false,
        }
    }

    /// Returns the next event payload, or `None` once the stream ends.
    /// A trailing incomplete event is dropped.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(data) = self.take_event()? {
                return Ok(Some(data));
            }
            if self.eof {
                return Ok(None);
            }
            match self.chunks.next_chunk().await.map_err(Error::Chunks)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn take_event(&mut self) -> Result<Option<String>, Error> {
        // Multi-byte characters may be split across chunks, so we only
        // decode once a whole event block is buffered.
        while let Some((end, sep_len)) = find_boundary(&self.buf) {
            let block: Vec<u8> = self.buf.drain(..end + sep_len).collect();
            let block = str::from_utf8(&block[..end])
                .map_err(|_| Error::InvalidPayload)?;

            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let Some((field, value)) = line.split_once(':') else {
                    return Err(Error::InvalidPayload);
                };
                if field != "data" {
                    continue;
                }
                let value = value.strip_prefix(' ').unwrap_or(value);
                let data = data.get_or_insert_default();
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value);
            }

            if data.is_some() {
                return Ok(data);
            }
        }
        Ok(None)
    }
}

fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    (0..buf.len()).find_map(|idx| {
        let rest = &buf[idx..];
        if rest.starts_with(b"\n\n") {
            Some((idx, 2))
        } else if rest.starts_with(b"\r\n\r\n") {
            Some((idx, 4))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(parts: Vec<Bytes>) -> Sse {
        Sse::new(Chunks::from_vec_deque(parts.into()))
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_from(vec![
            Bytes::from_static(b"data: hello\n\n"),
            Bytes::from_static(b"data: bye\n\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_across_chunks() {
        let mut sse = sse_from(vec![
            Bytes::from_static(b"data:"),
            Bytes::from_static(b" hel"),
            Bytes::from_static(b"lo\n"),
            Bytes::from_static(b"\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_multibyte_character() {
        // "ü" is 0xC3 0xBC.
        let mut sse = sse_from(vec![
            Bytes::from_static(b"data: Gr\xC3"),
            Bytes::from_static(b"\xBCn\n\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "Grün");
    }

    #[tokio::test]
    async fn test_comments_crlf_and_other_fields() {
        let mut sse = sse_from(vec![
            Bytes::from_static(b": keep-alive\n\n"),
            Bytes::from_static(
                b"event: chunk\r\nid: 7\r\ndata: one\r\ndata: two\r\n\r\n",
            ),
        ]);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "one\ntwo");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_from(vec![Bytes::from_static(b"xxxxxx\n\n")]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let mut sse = sse_from(vec![Bytes::from_static(b"xxxxxx\n")]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_from(vec![
            Bytes::from_static(b"data: hello\n"),
            Bytes::from_static(b"data: bye\n"),
        ]);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
