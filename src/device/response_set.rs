// ABOUTME: Final-result token table - the lines that terminate a command's response
// ABOUTME: Matching is by line prefix over an explicit ordered list

/// The tokens whose appearance at the start of a line ends the in-flight
/// command's response. `custom_final` extends the standard set for vendor
/// firmwares with additional terminal lines.
#[derive(Clone, Debug)]
pub struct ResponseSet {
    pub ok: String,
    pub error: String,
    pub no_carrier: String,
    pub no_answer: String,
    pub no_dialtone: String,
    pub busy: String,
    pub connect: String,
    pub cme_error: String,
    pub cms_error: String,
    pub cis_error: String,
    pub prompt: String,
    pub custom_final: Vec<String>,
}

impl Default for ResponseSet {
    fn default() -> Self {
        ResponseSet {
            ok: "OK".into(),
            error: "ERROR".into(),
            no_carrier: "NO CARRIER".into(),
            no_answer: "NO ANSWER".into(),
            no_dialtone: "NO DIALTONE".into(),
            busy: "BUSY".into(),
            connect: "CONNECT".into(),
            cme_error: "+CME ERROR".into(),
            cms_error: "+CMS ERROR".into(),
            cis_error: "+CIS ERROR".into(),
            prompt: ">".into(),
            custom_final: Vec::new(),
        }
    }
}

impl ResponseSet {
    /// The explicit ordered list of final tokens.
    pub fn finals(&self) -> Vec<&str> {
        let mut finals = vec![
            self.ok.as_str(),
            self.error.as_str(),
            self.no_carrier.as_str(),
            self.no_answer.as_str(),
            self.no_dialtone.as_str(),
            self.busy.as_str(),
            self.connect.as_str(),
            self.cme_error.as_str(),
            self.cms_error.as_str(),
            self.cis_error.as_str(),
            self.prompt.as_str(),
        ];
        finals.extend(self.custom_final.iter().map(String::as_str));
        finals
    }

    /// True when `line` starts with any non-empty final token.
    pub fn is_final(&self, line: &str) -> bool {
        self.finals()
            .iter()
            .any(|token| !token.is_empty() && line.starts_with(token))
    }

    /// True when `line` reports success.
    pub fn is_success(&self, line: &str) -> bool {
        !self.ok.is_empty() && line.starts_with(&self.ok)
    }

    /// True when `line` reports an error result.
    pub fn is_error(&self, line: &str) -> bool {
        [&self.error, &self.cme_error, &self.cms_error, &self.cis_error]
            .iter()
            .any(|token| !token.is_empty() && line.starts_with(token.as_str()))
    }
}
