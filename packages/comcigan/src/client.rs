use base64::{Engine as _, prelude::BASE64_STANDARD};
use encoding_rs::EUC_KR;
use serde_json::Value;
use url::Url;

use crate::error::Error;
use crate::eval;
use crate::extract::Patterns;
use crate::parse;
use crate::schedule::WeeklySchedule;

/// The portal's fixed entry host. It serves only a frameset shell; the real
/// content host is discovered from its frame redirect at runtime.
const ENTRY_HOST: &str = "http://컴시간학생.kr";

/// Day offset literal sent with every timetable request. The portal accepts
/// an offset selecting the reference week; this client always asks for the
/// current one.
const DAY_OFFSET: &str = "0";

/// JSON field carrying the school search results.
const SEARCH_RESULT_FIELD: &str = "학교검색";
/// JSON field carrying the per-grade class counts.
const CLASS_COUNT_FIELD: &str = "학급수";
/// Positional index of the school code inside a search result tuple.
const SCHOOL_CODE_INDEX: usize = 3;

#[derive(Debug, Clone)]
pub struct TimetableOptions {
    /// Keep a copy of the last fetched schedule, retrievable via
    /// [`Timetable::snapshot`].
    pub retain_snapshot: bool,
    /// Highest grade to fetch, starting from 1.
    pub max_grade: u32,
}

impl Default for TimetableOptions {
    fn default() -> Self {
        Self {
            retain_snapshot: false,
            max_grade: 3,
        }
    }
}

/// State accumulated by a successful [`Timetable::init`]. Immutable once
/// built; every later request derives its URL from these fields.
struct Session {
    origin: String,
    content_url: String,
    page_source: String,
    sc_data: Vec<String>,
    extract_code: String,
}

/// One school search result as returned by the portal: a positional tuple
/// whose fourth field is the school code used by the timetable request.
#[derive(Debug, Clone)]
pub struct SchoolMatch(Value);

impl SchoolMatch {
    /// The school code field, rendered as the request expects it. The portal
    /// returns it as a bare number in the wild but a string is tolerated.
    pub fn code(&self) -> String {
        match self.0.get(SCHOOL_CODE_INDEX) {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Number(code)) => code.to_string(),
            _ => String::new(),
        }
    }

    /// The raw positional tuple.
    pub fn fields(&self) -> &Value {
        &self.0
    }
}

/// Client for the Comcigan timetable portal.
///
/// The portal exposes no stable API: endpoint paths, request parameters and
/// even the response formatting logic are mined from its pages at runtime.
/// Usage is a staged lifecycle — [`init`](Self::init) once, then
/// [`select_school`](Self::select_school), then
/// [`get_timetable`](Self::get_timetable) as often as needed. Each stage
/// fails fast with a typed error naming the scraping assumption that broke,
/// and a failed stage never discards state an earlier stage completed.
pub struct Timetable {
    http_client: reqwest::Client,
    patterns: Patterns,
    selectors: parse::Selectors,
    options: TimetableOptions,
    session: Option<Session>,
    school: Option<SchoolMatch>,
    snapshot: Option<WeeklySchedule>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::with_options(TimetableOptions::default())
    }

    pub fn with_options(options: TimetableOptions) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            patterns: Patterns::new(),
            selectors: parse::Selectors::new(),
            options,
            session: None,
            school: None,
            snapshot: None,
        }
    }

    /// Resolves the content host behind the portal's frame redirect, decodes
    /// the EUC-KR content page and mines the `sc_data` tokens and search
    /// route from it. Must succeed before any other operation.
    pub async fn init(&mut self) -> Result<(), Error> {
        let entry = self
            .http_client
            .get(ENTRY_HOST)
            .send()
            .await?
            .text()
            .await?;
        let content_url = self.patterns.frame_src(&entry)?;
        let origin = Url::parse(&content_url)
            .map_err(|_| Error::Discovery("frame src is not an absolute URL"))?
            .origin()
            .ascii_serialization();

        // 응답은 EUC-KR 바이트이므로 직접 디코딩한다.
        let bytes = self
            .http_client
            .get(&content_url)
            .send()
            .await?
            .bytes()
            .await?;
        let page_source = EUC_KR.decode(&bytes).0.into_owned();

        let sc_data = self.patterns.sc_data(&page_source)?;
        let extract_code = self.patterns.route_code(&page_source)?;

        tracing::info!(%origin, tokens = sc_data.len(), "content host resolved");

        self.session = Some(Session {
            origin,
            content_url,
            page_source,
            sc_data,
            extract_code,
        });
        Ok(())
    }

    /// Searches the portal for `keyword` and stores the result. Exactly one
    /// school must match; zero or several is an error and leaves any
    /// previously selected school in place.
    pub async fn select_school(&mut self, keyword: &str) -> Result<(), Error> {
        let session = self.session.as_ref().ok_or(Error::NotInitialized)?;

        let url = format!(
            "{}{}{}",
            session.origin,
            session.extract_code,
            euc_kr_escape(keyword)
        );
        tracing::info!(keyword, "searching school");

        let body = self.http_client.get(&url).send().await?.text().await?;
        self.school = Some(single_school_match(&body)?);
        Ok(())
    }

    /// Fetches the whole school's weekly timetable for grades
    /// `1..=max_grade`, running the page's own formatting routine per class
    /// and parsing its markup.
    pub async fn get_timetable(&mut self) -> Result<WeeklySchedule, Error> {
        let session = self.session.as_ref().ok_or(Error::NotInitialized)?;
        let school = self.school.as_ref().ok_or(Error::SchoolNotSelected)?;

        let composite = format!(
            "{}{}_{}_{}",
            session.sc_data[0],
            school.code(),
            DAY_OFFSET,
            session.sc_data[2]
        );
        let route = session.extract_code.split('?').next().unwrap_or_default();
        let url = format!(
            "{}{}?{}",
            session.origin,
            route,
            BASE64_STANDARD.encode(&composite)
        );

        let body = self.http_client.get(&url).send().await?.text().await?;
        if body.is_empty() {
            return Err(Error::EmptyResponse);
        }
        let json_text = truncate_at_last_brace(&body);
        let payload: Value = serde_json::from_str(json_text)?;

        let script = self.patterns.inline_scripts(&session.page_source);
        let routine = self.patterns.routine_name(&script)?;

        let mut timetable = WeeklySchedule::new();
        for grade in 1..=self.options.max_grade {
            let class_count = class_count(&payload, grade);
            tracing::debug!(grade, class_count, "materializing class tables");
            let classes = timetable.entry(grade).or_default();
            for class_number in 1..=class_count {
                let markup =
                    eval::render_class_table(&script, &routine, json_text, grade, class_number)?;
                classes.insert(
                    class_number,
                    parse::class_timetable(&self.selectors, &markup, grade, class_number),
                );
            }
        }

        if self.options.retain_snapshot {
            self.snapshot = Some(timetable.clone());
        }
        Ok(timetable)
    }

    /// The last schedule retained by `retain_snapshot`, or an empty mapping
    /// when none exists.
    pub fn snapshot(&self) -> WeeklySchedule {
        self.snapshot.clone().unwrap_or_default()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The resolved content page URL, once initialized.
    pub fn content_url(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.content_url.as_str())
    }

    /// The currently selected school, once `select_school` succeeded.
    pub fn school(&self) -> Option<&SchoolMatch> {
        self.school.as_ref()
    }
}

impl Default for Timetable {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent-escapes every EUC-KR byte of the keyword, the only query encoding
/// the portal's search endpoint understands.
fn euc_kr_escape(keyword: &str) -> String {
    let (bytes, _, _) = EUC_KR.encode(keyword);
    let mut escaped = String::with_capacity(bytes.len() * 3);
    for byte in bytes.iter() {
        escaped.push('%');
        escaped.push_str(&format!("{byte:x}"));
    }
    escaped
}

/// Validates a school search response body: truncated, JSON-decoded, and
/// required to hold exactly one result. Zero or several matches is a hard
/// error; every later request assumes one specific school code.
fn single_school_match(body: &str) -> Result<SchoolMatch, Error> {
    let parsed: Value = serde_json::from_str(truncate_at_last_brace(body))?;
    let mut results = parsed
        .get(SEARCH_RESULT_FIELD)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    match results.len() {
        0 => Err(Error::NoMatch),
        1 => Ok(SchoolMatch(results.remove(0))),
        count => Err(Error::AmbiguousMatch(count)),
    }
}

/// The portal's JSON bodies consistently carry trailing bytes after the
/// final `}`; everything past it is dropped before decoding. Bodies without
/// a brace are passed through untouched so the decode error surfaces.
fn truncate_at_last_brace(body: &str) -> &str {
    match body.rfind('}') {
        Some(idx) => &body[..=idx],
        None => body,
    }
}

fn class_count(payload: &Value, grade: u32) -> u32 {
    let counts = &payload[CLASS_COUNT_FIELD];
    counts
        .get(grade as usize)
        .or_else(|| counts.get(grade.to_string()))
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32
}
