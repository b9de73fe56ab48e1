/// Verbs the server uses to acknowledge or reject control requests.
///
/// Lines led by one of these split as `VERB|LLLL|PAYLOAD` with the payload
/// kept opaque — it may itself contain pipes.
pub const ACK_VERBS: [&str; 5] = ["CACK", "CERR", "CMOK", "CMER", "DACK"];

/// Verb assigned to lines that match no known form.
pub const RAW_VERB: &str = "SRV";

/// One decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Frame {
    /// Leading verb; never empty.
    pub verb: String,
    /// Ordered key/value pairs from the payload. Positional fields (no
    /// `:` separator, such as the length token) carry an empty key.
    pub fields: Vec<(String, String)>,
    /// The payload text: everything after the length token, or the whole
    /// line for raw frames.
    pub raw_payload: String,
}

impl Frame {
    /// A raw frame wrapping text that matched no known form.
    pub fn raw(payload: impl Into<String>) -> Self {
        Self {
            verb: RAW_VERB.to_string(),
            fields: Vec::new(),
            raw_payload: payload.into(),
        }
    }

    /// Case-insensitive field lookup; positional fields never match.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| !k.is_empty() && k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Encode a frame into the wire form `VERB|LLLL|DATA\n`.
///
/// `LLLL` is the payload length zero-padded to four digits. It is
/// informational — receivers frame on the newline — so `data` must not
/// itself contain a newline.
pub fn encode_frame(verb: &str, data: &str) -> String {
    debug_assert!(
        !data.contains('\n'),
        "frame payload must not contain a newline"
    );
    format!("{verb}|{len:04}|{data}\n", len = data.len())
}

/// Decode one line into a [`Frame`].
///
/// Never fails: input that matches no known form degrades to a raw frame
/// with verb [`RAW_VERB`]. Accepted forms, in priority order:
///
/// 1. `VERB|LLLL|PAYLOAD` for the acknowledgement verbs — payload opaque
/// 2. `VERB KEY=VAL ...` — legacy space-separated form
/// 3. `VERB|k1:v1|k2:v2` — pipe form; `TELE` normalizes to `TELEMETRY`,
///    a part without `:` becomes a positional field
/// 4. anything else — raw
pub fn decode_frame(line: &str) -> Frame {
    let line = line.trim();

    // Ack/error form. The payload sits after the second pipe, or after the
    // first when the length token was omitted.
    if let Some((verb, rest)) = line.split_once('|') {
        if ACK_VERBS.contains(&verb) {
            let payload = match rest.split_once('|') {
                Some((_len, payload)) => payload,
                None => rest,
            };
            return Frame {
                verb: verb.to_string(),
                fields: Vec::new(),
                raw_payload: payload.to_string(),
            };
        }
    }

    // Legacy space form: a clean verb token followed by KEY=VALUE tokens.
    let mut tokens = line.split_whitespace();
    if let Some(verb) = tokens.next() {
        if !verb.contains('|') && !verb.contains('=') {
            let fields: Vec<(String, String)> = tokens
                .filter_map(|token| token.split_once('='))
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .collect();
            if !fields.is_empty() {
                let raw_payload = match line.find(char::is_whitespace) {
                    Some(pos) => line[pos..].trim_start().to_string(),
                    None => String::new(),
                };
                return Frame {
                    verb: verb.to_string(),
                    fields,
                    raw_payload,
                };
            }
        }
    }

    // Pipe form.
    if let Some((verb, rest)) = line.split_once('|') {
        if !verb.is_empty() {
            let verb = if verb == "TELE" { "TELEMETRY" } else { verb };
            let fields = rest
                .split('|')
                .map(|part| match part.split_once(':') {
                    Some((key, value)) => (key.trim().to_string(), value.to_string()),
                    None => (String::new(), part.to_string()),
                })
                .collect();
            // Payload mirrors the canonical wire layout: skip the length
            // token when one is present.
            let raw_payload = match rest.split_once('|') {
                Some((_len, tail)) => tail.to_string(),
                None => rest.to_string(),
            };
            return Frame {
                verb: verb.to_string(),
                fields,
                raw_payload,
            };
        }
    }

    Frame::raw(line)
}
