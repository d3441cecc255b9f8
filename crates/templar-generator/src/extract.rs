/// Locate the JSON document inside model output.
///
/// Models wrap JSON in markdown fences more often than not, sometimes with
/// prose around it. Preference order: a fenced ```json block, any fenced
/// block, then the outermost `{ ... }` span of the raw text.
pub fn extract_json(text: &str) -> Option<&str> {
  if let Some(block) = fenced_block(text, "```json") {
    return Some(block);
  }
  if let Some(block) = fenced_block(text, "```") {
    return Some(block);
  }

  let start = text.find('{')?;
  let end = text.rfind('}')?;
  if end < start {
    return None;
  }
  Some(text[start..=end].trim())
}

fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
  let after_open = text.find(opener)? + opener.len();
  let rest = &text[after_open..];
  let close = rest.find("```")?;
  let block = rest[..close].trim();
  if block.is_empty() { None } else { Some(block) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_from_json_fence() {
    let text = "Here is your workflow:\n```json\n{\"workflow_name\": \"x\"}\n```\nEnjoy!";
    assert_eq!(extract_json(text), Some("{\"workflow_name\": \"x\"}"));
  }

  #[test]
  fn extracts_from_bare_fence() {
    let text = "```\n{\"a\": 1}\n```";
    assert_eq!(extract_json(text), Some("{\"a\": 1}"));
  }

  #[test]
  fn extracts_raw_object_without_fences() {
    let text = "Sure! {\"a\": {\"b\": 2}} hope that helps";
    assert_eq!(extract_json(text), Some("{\"a\": {\"b\": 2}}"));
  }

  #[test]
  fn plain_json_passes_through() {
    let text = "{\"steps\": []}";
    assert_eq!(extract_json(text), Some("{\"steps\": []}"));
  }

  #[test]
  fn returns_none_when_no_object_present() {
    assert_eq!(extract_json("I cannot help with that."), None);
    assert_eq!(extract_json(""), None);
  }
}
