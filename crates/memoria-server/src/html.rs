//! Read-only HTML pages for QR-resolved public access.
//!
//! Plain string assembly — the pages are small enough that a template
//! engine would be more machinery than markup. All interpolated values go
//! through [`esc`].

use memoria_core::{
  obituary::Obituary,
  program::{Program, ProgramView},
};

const STYLE: &str = "body{font-family:Georgia,serif;max-width:42rem;margin:2rem auto;\
padding:0 1rem;color:#2c3e50;line-height:1.6}h1{text-align:center;margin-bottom:.25rem}\
.dates{text-align:center;color:#7f8c8d;margin-top:0}img.portrait{display:block;\
margin:1.5rem auto;max-width:250px;border-radius:4px}h2{border-bottom:1px solid #ddd;\
padding-bottom:.25rem}ul.schedule{list-style:none;padding:0}ul.schedule li{margin:.5rem 0}\
.tribute{font-style:italic}.tribute-author{text-align:right;color:#7f8c8d}\
.epitaph{text-align:center;font-style:italic;margin-top:3rem;color:#7f8c8d}";

/// Escape a value for interpolation into HTML text or attributes.
fn esc(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

fn page(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
     <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
     <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
    esc(title)
  )
}

fn push_header(out: &mut String, program: &Program) {
  out.push_str(&format!("<h1>{}</h1>\n", esc(&program.deceased_name)));
  if let (Some(birth), Some(death)) =
    (&program.date_of_birth, &program.date_of_death)
    && !birth.is_empty()
    && !death.is_empty()
  {
    out.push_str(&format!(
      "<p class=\"dates\">{} &ndash; {}</p>\n",
      esc(birth),
      esc(death)
    ));
  }
  if let Some(photo) = &program.photo_url {
    out.push_str(&format!(
      "<img class=\"portrait\" src=\"{}\" alt=\"{}\">\n",
      esc(photo),
      esc(&program.deceased_name)
    ));
  }
}

fn push_text_section(out: &mut String, heading: &str, text: &str) {
  if text.is_empty() {
    return;
  }
  out.push_str(&format!("<h2>{}</h2>\n", esc(heading)));
  for line in text.lines() {
    let line = line.trim();
    if !line.is_empty() {
      out.push_str(&format!("<p>{}</p>\n", esc(line)));
    }
  }
}

/// The public program page: header, service details, schedule, and a link
/// to the obituary when one exists.
pub fn program_page(view: &ProgramView) -> String {
  let program = &view.program;
  let mut body = String::new();
  push_header(&mut body, program);

  body.push_str("<h2>Funeral Service</h2>\n<ul class=\"schedule\">\n");
  body.push_str(&format!(
    "<li><strong>Date &amp; Time:</strong> {}</li>\n",
    esc(&program.funeral_date)
  ));
  body.push_str(&format!(
    "<li><strong>Location:</strong> {}</li>\n",
    esc(&program.funeral_location)
  ));
  body.push_str("</ul>\n");

  if !view.events.is_empty() {
    body.push_str("<h2>Order of Service</h2>\n<ul class=\"schedule\">\n");
    for event in &view.events {
      body.push_str(&format!(
        "<li><strong>{}</strong> &mdash; {}",
        esc(&event.time),
        esc(&event.title)
      ));
      if let Some(speaker) = &event.speaker {
        body.push_str(&format!(" ({})", esc(speaker)));
      }
      if let Some(description) = &event.description {
        body.push_str(&format!("<br>{}", esc(description)));
      }
      body.push_str("</li>\n");
    }
    body.push_str("</ul>\n");
  }

  if view.obituary.is_some() {
    body.push_str(&format!(
      "<p><a href=\"/api/funeral/program/{}/obituary/view\">Read the obituary</a></p>\n",
      esc(&program.access_id)
    ));
  }

  page(&program.deceased_name, &body)
}

/// The obituary page: biography, family, special message, photos, and
/// tributes.
pub fn obituary_page(program: &Program, obituary: &Obituary) -> String {
  let mut body = String::new();
  push_header(&mut body, program);

  push_text_section(&mut body, "Biography", &obituary.biography);
  if let Some(family) = &obituary.family_details {
    push_text_section(&mut body, "Family", family);
  }
  if let Some(message) = &obituary.special_message {
    push_text_section(&mut body, "Special Message", message);
  }

  if !obituary.photos.is_empty() {
    body.push_str("<h2>Photos</h2>\n");
    for photo in &obituary.photos {
      body.push_str(&format!(
        "<img class=\"portrait\" src=\"{}\" alt=\"\">\n",
        esc(photo)
      ));
    }
  }

  let complete: Vec<_> =
    obituary.tributes.iter().filter(|t| t.is_complete()).collect();
  if !complete.is_empty() {
    body.push_str("<h2>Tributes &amp; Messages</h2>\n");
    for tribute in complete {
      body.push_str(&format!(
        "<p class=\"tribute\">&ldquo;{}&rdquo;</p>\n<p class=\"tribute-author\">&mdash; {}</p>\n",
        esc(&tribute.message),
        esc(&tribute.author)
      ));
    }
  }

  body.push_str(
    "<p class=\"epitaph\">In the hearts of those who loved you, you will always be there.</p>\n",
  );

  page(&program.deceased_name, &body)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use memoria_core::obituary::Tribute;

  use super::*;

  fn program() -> Program {
    Program {
      id:               1,
      deceased_name:    "Alice <Liddell>".to_string(),
      date_of_birth:    Some("1852".to_string()),
      date_of_death:    Some("1934".to_string()),
      funeral_date:     "Nov 20".to_string(),
      funeral_location: "Lyndhurst".to_string(),
      photo_url:        None,
      access_id:        "abc".to_string(),
      is_active:        true,
      created_at:       Utc::now(),
      updated_at:       None,
    }
  }

  #[test]
  fn values_are_escaped() {
    let view = ProgramView { program: program(), events: vec![], obituary: None };
    let html = program_page(&view);
    assert!(html.contains("Alice &lt;Liddell&gt;"));
    assert!(!html.contains("<Liddell>"));
  }

  #[test]
  fn obituary_link_only_when_present() {
    let mut view =
      ProgramView { program: program(), events: vec![], obituary: None };
    assert!(!program_page(&view).contains("Read the obituary"));

    view.obituary = Some(Obituary {
      id:              1,
      program_id:      1,
      biography:       "Bio".to_string(),
      family_details:  None,
      special_message: None,
      photos:          vec![],
      tributes:        vec![],
      pdf_url:         None,
      created_at:      Utc::now(),
      updated_at:      None,
    });
    assert!(program_page(&view).contains("/api/funeral/program/abc/obituary/view"));
  }

  #[test]
  fn incomplete_tributes_are_not_shown() {
    let obituary = Obituary {
      id:              1,
      program_id:      1,
      biography:       "Bio".to_string(),
      family_details:  None,
      special_message: None,
      photos:          vec![],
      tributes:        vec![
        Tribute::new("Sam", "Rest well"),
        Tribute { author: String::new(), message: "hidden".to_string() },
      ],
      pdf_url:         None,
      created_at:      Utc::now(),
      updated_at:      None,
    };
    let html = obituary_page(&program(), &obituary);
    assert!(html.contains("Rest well"));
    assert!(!html.contains("hidden"));
  }
}
