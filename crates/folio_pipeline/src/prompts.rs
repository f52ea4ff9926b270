//! Prompt assembly for the pipeline's model calls.
//!
//! The expected output schema is communicated informally through an inline
//! example payload, and each completion is biased toward valid JSON with an
//! assistant-turn prefill. Validation stays defensive on the way back; see
//! [`crate::recovery`].

use crate::planner::PagePair;
use crate::scenes::SpreadBrief;
use folio_core::{Character, Location};
use std::fmt::Write as _;

/// System prompt for the spread-planning call.
pub const PLANNER_SYSTEM: &str = "You are a picture-book layout planner. You group manuscript \
pages into two-page spreads and identify which catalog characters and locations appear on each \
page. Output ONLY valid JSON matching the example. Never invent names outside the catalogs.";

/// Assistant-turn prefill for the spread-planning call.
pub const PLANNER_PREFILL: &str = "{\"spreads\": [";

/// System prompt for the scene-decision call.
pub const SCENES_SYSTEM: &str = "You are an illustration director for a picture book. For each \
spread you decide the canonical location, which characters are visible and at what emphasis, \
and you write the illustration prompt. Output ONLY valid JSON matching the example. Never \
invent names outside the catalogs.";

/// Assistant-turn prefill for the scene-decision call.
pub const SCENES_PREFILL: &str = "{\"decisions\": [";

fn write_catalogs(out: &mut String, characters: &[Character], locations: &[Location]) {
    out.push_str("Character catalog (the only allowed character names):\n");
    for character in characters {
        let _ = writeln!(out, "- {}: {}", character.name, character.description);
    }
    out.push_str("\nLocation catalog (the only allowed location names):\n");
    for location in locations {
        let _ = writeln!(out, "- {}: {}", location.name, location.description);
    }
}

/// Build the user prompt for the spread-planning call.
///
/// Contains every spread's page texts plus the allowed name catalogs and an
/// inline example of the expected JSON shape.
pub fn spread_planning_prompt(
    pairs: &[PagePair],
    characters: &[Character],
    locations: &[Location],
) -> String {
    let mut out = String::new();
    write_catalogs(&mut out, characters, locations);

    out.push_str("\nSpreads to plan:\n");
    for pair in pairs {
        let _ = writeln!(out, "\nSpread {}:", pair.index);
        let _ = writeln!(out, "  Left page: {}", pair.left.text);
        match &pair.right {
            Some(right) => {
                let _ = writeln!(out, "  Right page: {}", right.text);
            }
            None => out.push_str("  Right page: (none, final single page)\n"),
        }
    }

    out.push_str(
        r#"
For every spread, write a one-line scene summary and list which catalog
characters appear on each page with their prominence. Respond with JSON of
exactly this shape:

{
  "spreads": [
    {
      "spreadIndex": 0,
      "sceneSummary": "The fox climbs the lighthouse stairs at dusk",
      "pages": [
        {
          "page": "left",
          "location": "The Lighthouse",
          "characters": [
            {"name": "Fox", "prominence": "primary", "justification": "named in the text"}
          ]
        },
        {"page": "right", "location": "The Lighthouse", "characters": []}
      ]
    }
  ]
}

"prominence" is one of "primary", "secondary", "background". Output ONLY the JSON document.
"#,
    );
    out
}

/// Build the user prompt for one scene-decision batch.
pub fn scene_decision_prompt(
    batch: &[SpreadBrief],
    characters: &[Character],
    locations: &[Location],
) -> String {
    let mut out = String::new();
    write_catalogs(&mut out, characters, locations);

    out.push_str("\nSpreads to direct:\n");
    for brief in batch {
        let _ = writeln!(out, "\nSpread {} (summary: {}):", brief.index, brief.summary);
        let _ = writeln!(out, "  Left page: {}", brief.left_text);
        match &brief.right_text {
            Some(right) => {
                let _ = writeln!(out, "  Right page: {}", right);
            }
            None => out.push_str("  Right page: (none)\n"),
        }
    }

    out.push_str(
        r#"
For every spread above, decide the canonical scene. Respond with JSON of
exactly this shape, one decision per spread:

{
  "decisions": [
    {
      "spreadIndex": 0,
      "primaryLocation": "The Lighthouse",
      "characters": [
        {"name": "Fox", "role": "primary", "confidence": 0.95, "reason": "central to the scene"}
      ],
      "excludedCharacters": [
        {"name": "Heron", "reason": "mentioned but offstage"}
      ],
      "sceneSummary": "The fox climbs the lighthouse stairs at dusk",
      "illustrationPrompt": "A small red fox climbing a spiral lighthouse staircase, warm dusk light",
      "compositionNotes": "low angle, staircase curving out of frame",
      "mood": "quiet anticipation",
      "doNotInclude": "no humans, no text in the image",
      "negativePrompt": "text, watermark, extra limbs"
    }
  ]
}

"role" must be exactly one of "primary", "secondary", "background".
"primaryLocation" may be null. Output ONLY the JSON document.
"#,
    );
    out
}

/// Instruction text for the front-cover generation request.
///
/// The front cover is a full-bleed illustration carrying the title and
/// author credit.
pub fn front_cover_instructions(prompt: &str, title: &str, author: &str) -> String {
    format!(
        "Generate the FRONT cover of a printed picture book.\n\
         Scene: {prompt}\n\
         Render the title \"{title}\" prominently near the top and the author \
         credit \"{author}\" below it, both in a hand-lettered style that suits \
         the illustration.\n\
         Full-bleed portrait composition. Match the palette, line work, and \
         texture of the attached reference images exactly. No other text."
    )
}

/// Instruction text for the back-cover generation request.
///
/// The back cover stays quieter than the front: same world and style, but
/// with open space reserved for blurb text and a barcode.
pub fn back_cover_instructions(prompt: &str, title: &str) -> String {
    format!(
        "Generate the BACK cover of the printed picture book \"{title}\".\n\
         Scene: {prompt}\n\
         Quieter companion piece to the front cover: a small vignette or \
         emptier view of the same world. Leave generous unilluminated space in \
         the middle for blurb text and a clear area in the lower right for a \
         barcode. Match the palette, line work, and texture of the attached \
         reference images exactly. No text anywhere."
    )
}
