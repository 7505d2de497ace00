//! Pattern miners for the portal's convention-based page format.
//!
//! The portal has no schema; every request parameter is pulled out of the
//! page source by anchor substring + bounded window + pattern match. Each
//! extraction is its own function with its own failure value so a site
//! layout change isolates to a single miner.

use regex::Regex;

use crate::error::{Error, Identifier};

/// Window widths after each anchor, wide enough in practice to contain the
/// token the anchor precedes.
const SC_DATA_WINDOW: usize = 30;
const SCHOOL_RA_WINDOW: usize = 50;

pub(crate) struct Patterns {
    frame: Regex,
    frame_src: Regex,
    route: Regex,
    args: Regex,
    script_open: Regex,
    routine_name: Regex,
}

impl Patterns {
    pub(crate) fn new() -> Self {
        Self {
            frame: Regex::new(r#"<frame [^>]*src="[^"]*"[^>]*>"#).unwrap(),
            frame_src: Regex::new(r#"src="([^"]*)""#).unwrap(),
            route: Regex::new(r"url:'.(.*?)'").unwrap(),
            args: Regex::new(r"\(.*?\)").unwrap(),
            script_open: Regex::new(r"<script language(.*?)>").unwrap(),
            routine_name: Regex::new(r"function 자료[^\(]*").unwrap(),
        }
    }

    /// Locates the frame redirect target in the portal's entry page.
    /// The entry page is a frameset shell; its single frame points at the
    /// real content host.
    pub(crate) fn frame_src(&self, body: &str) -> Result<String, Error> {
        let page = body.to_lowercase().replace('\'', "\"");
        let tag = self
            .frame
            .find(&page)
            .ok_or(Error::Discovery("no frame tag in entry page"))?;
        let src = self
            .frame_src
            .captures(tag.as_str())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(Error::Discovery("frame has no src attribute"))?;
        if src.is_empty() {
            return Err(Error::Discovery("frame src attribute is empty"));
        }
        Ok(src)
    }

    /// Mines the `sc_data(...)` argument tokens from the content page. The
    /// timetable request consumes the first and third token, so fewer than
    /// three counts as a failed extraction.
    pub(crate) fn sc_data(&self, page: &str) -> Result<Vec<String>, Error> {
        let window = anchor_window(page, "sc_data('", SC_DATA_WINDOW)
            .ok_or(Error::IdentifierNotFound(Identifier::ScData))?;
        let call = self
            .args
            .find(&window)
            .ok_or(Error::IdentifierNotFound(Identifier::ScData))?;
        let tokens: Vec<String> = call
            .as_str()
            .trim_matches(['(', ')'])
            .replace('\'', "")
            .split(',')
            .map(str::to_string)
            .collect();
        if tokens.len() < 3 {
            return Err(Error::IdentifierNotFound(Identifier::ScData));
        }
        Ok(tokens)
    }

    /// Mines the search route fragment following the `school_ra(sc)` anchor.
    /// The capture skips the leading `.` of the relative `url:'./...'` form,
    /// leaving a path that concatenates directly onto the origin.
    pub(crate) fn route_code(&self, page: &str) -> Result<String, Error> {
        let window = anchor_window(page, "school_ra(sc)", SCHOOL_RA_WINDOW)
            .ok_or(Error::IdentifierNotFound(Identifier::ExtractCode))?;
        let caps = self
            .route
            .captures(&window)
            .ok_or(Error::IdentifierNotFound(Identifier::ExtractCode))?;
        Ok(caps[1].to_string())
    }

    /// Concatenates the bodies of every inline script block in document
    /// order, using the first opening-tag variant found as the delimiter for
    /// all blocks.
    pub(crate) fn inline_scripts(&self, page: &str) -> String {
        let Some(open) = self.script_open.find(page) else {
            return String::new();
        };
        let block = Regex::new(&format!(
            "(?is){}(.*?)</script>",
            regex::escape(open.as_str())
        ))
        .unwrap();
        block
            .captures_iter(page)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Finds the name of the table formatting routine inside the
    /// concatenated scripts. The portal names it with a fixed marker word
    /// plus a numeric suffix that changes between releases.
    pub(crate) fn routine_name(&self, script: &str) -> Result<String, Error> {
        let name = self
            .routine_name
            .find(script)
            .ok_or(Error::FormattingRoutineNotFound)?
            .as_str()
            .trim_start_matches("function")
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(Error::FormattingRoutineNotFound);
        }
        Ok(name)
    }
}

/// A bounded run of characters starting at the anchor, with the first space
/// removed as the portal sometimes pads its call sites.
fn anchor_window(page: &str, anchor: &str, width: usize) -> Option<String> {
    let idx = page.find(anchor)?;
    Some(
        page[idx..]
            .chars()
            .take(width)
            .collect::<String>()
            .replacen(' ', "", 1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY_PAGE: &str = "<html><Frameset rows='100%'>\
        <Frame Name='Ifrm' src='http://comci.example:4082/st' scrolling='auto'>\
        </Frameset></html>";

    const CONTENT_PAGE: &str = "<html><head>\
        <script language='JavaScript' type='text/javascript'>\
        function school_ra(sc){var sc2=$.ajax({url:'./36179?8c8d',type:'GET'});}\
        </script>\
        <script language='JavaScript' type='text/javascript'>\
        function 자료478(자료,학년,반){return '<table></table>';}\
        </script>\
        <body onload=\"sc_data('7_85',sc,7,'') \"></body></html>";

    #[test]
    fn frame_src_found() {
        let patterns = Patterns::new();
        let src = patterns.frame_src(ENTRY_PAGE).unwrap();
        assert_eq!(src, "http://comci.example:4082/st");
    }

    #[test]
    fn frame_src_missing_frame() {
        let patterns = Patterns::new();
        let err = patterns.frame_src("<html><body>nothing</body></html>");
        assert!(matches!(err, Err(Error::Discovery(_))));
    }

    #[test]
    fn frame_src_without_src_attribute() {
        let patterns = Patterns::new();
        let err = patterns.frame_src("<html><frame name='Ifrm'></html>");
        assert!(matches!(err, Err(Error::Discovery(_))));
    }

    #[test]
    fn sc_data_tokens() {
        let patterns = Patterns::new();
        let tokens = patterns.sc_data(CONTENT_PAGE).unwrap();
        assert_eq!(tokens, vec!["7_85", "sc", "7", ""]);
    }

    #[test]
    fn sc_data_with_too_few_tokens() {
        let patterns = Patterns::new();
        let err = patterns.sc_data("<body onload=\"sc_data('x')\"></body>");
        assert!(matches!(
            err,
            Err(Error::IdentifierNotFound(Identifier::ScData))
        ));
    }

    #[test]
    fn sc_data_missing_anchor() {
        let patterns = Patterns::new();
        let err = patterns.sc_data("<html>no anchors here</html>");
        assert!(matches!(
            err,
            Err(Error::IdentifierNotFound(Identifier::ScData))
        ));
    }

    #[test]
    fn route_code_found() {
        let patterns = Patterns::new();
        let code = patterns.route_code(CONTENT_PAGE).unwrap();
        assert_eq!(code, "/36179?8c8d");
    }

    #[test]
    fn route_code_missing_anchor() {
        let patterns = Patterns::new();
        let err = patterns.route_code("<html>no anchors here</html>");
        assert!(matches!(
            err,
            Err(Error::IdentifierNotFound(Identifier::ExtractCode))
        ));
    }

    #[test]
    fn inline_scripts_concatenated_in_order() {
        let patterns = Patterns::new();
        let script = patterns.inline_scripts(CONTENT_PAGE);
        let ra = script.find("school_ra").unwrap();
        let routine = script.find("자료478").unwrap();
        assert!(ra < routine);
        assert!(!script.contains("<script"));
        assert!(!script.contains("</script>"));
    }

    #[test]
    fn inline_scripts_empty_without_blocks() {
        let patterns = Patterns::new();
        assert_eq!(patterns.inline_scripts("<html></html>"), "");
    }

    #[test]
    fn routine_name_found() {
        let patterns = Patterns::new();
        let script = patterns.inline_scripts(CONTENT_PAGE);
        assert_eq!(patterns.routine_name(&script).unwrap(), "자료478");
    }

    #[test]
    fn routine_name_missing() {
        let patterns = Patterns::new();
        let err = patterns.routine_name("function other(a,b){}");
        assert!(matches!(err, Err(Error::FormattingRoutineNotFound)));
    }
}
