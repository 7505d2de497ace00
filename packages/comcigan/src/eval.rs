//! Bounded evaluation of the portal's own table formatting routine.
//!
//! The routine that turns the raw timetable JSON into per-class markup ships
//! inside the content page and changes without notice, so it is executed
//! as-is instead of being reimplemented. The script is untrusted input: each
//! invocation runs in a fresh engine context with loop and recursion limits,
//! and any engine error fails the call closed.

use boa_engine::{Context, Source};

use crate::error::Error;

const LOOP_ITERATION_LIMIT: u64 = 1_000_000;
const RECURSION_LIMIT: usize = 512;

/// Runs `routine(data, grade, class_number)` against the page scripts and
/// returns the markup it produces. `data` is the truncated JSON response
/// text, spliced into the call site as an object literal exactly as the
/// routine expects.
pub(crate) fn render_class_table(
    script: &str,
    routine: &str,
    data: &str,
    grade: u32,
    class_number: u32,
) -> Result<String, Error> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
    context.runtime_limits_mut().set_recursion_limit(RECURSION_LIMIT);

    let program = format!("{script}\n\n{routine}({data},{grade},{class_number})");
    let value = context
        .eval(Source::from_bytes(program.as_bytes()))
        .map_err(|e| Error::Evaluation(e.to_string()))?;
    let markup = value
        .to_string(&mut context)
        .map_err(|e| Error::Evaluation(e.to_string()))?;
    Ok(markup.to_std_string_escaped())
}
