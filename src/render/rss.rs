use chrono::{DateTime, Utc};

use crate::config::ChannelConfig;
use crate::models::Item;

use super::{esc, excerpt};

const DESCRIPTION_CHARS: usize = 500;

/// RFC 822 form of a stored timestamp, or of `fallback` when it is missing
/// or unparseable.
fn rss_date(published: &str, fallback: DateTime<Utc>) -> String {
    DateTime::parse_from_rfc3339(published)
        .map(|dt| dt.to_rfc2822())
        .unwrap_or_else(|_| fallback.to_rfc2822())
}

fn push_item(out: &mut String, title: &str, link: &str, guid: &str, pub_date: &str, description: &str) {
    out.push_str("  <item>\n");
    out.push_str(&format!("    <title>{}</title>\n", esc(title)));
    out.push_str(&format!("    <link>{}</link>\n", esc(link)));
    out.push_str(&format!("    <guid>{}</guid>\n", esc(guid)));
    out.push_str(&format!("    <pubDate>{}</pubDate>\n", esc(pub_date)));
    out.push_str(&format!("    <description>{}</description>\n", esc(description)));
    out.push_str("  </item>\n");
}

/// RSS 2.0 document for `items`, led by a digest pseudo-item when `digest`
/// has text.
pub fn render_rss(
    channel: &ChannelConfig,
    items: &[Item],
    digest: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let build_date = now.to_rfc2822();

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    out.push_str("<channel>\n");
    out.push_str(&format!("  <title>{}</title>\n", esc(&channel.title)));
    out.push_str(&format!("  <link>{}</link>\n", esc(&channel.link)));
    out.push_str(&format!(
        "  <description>{}</description>\n",
        esc(&channel.description)
    ));
    out.push_str(&format!("  <lastBuildDate>{}</lastBuildDate>\n", build_date));
    out.push_str(&format!(
        "  <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        esc(&channel.self_link)
    ));

    if let Some(digest) = digest.filter(|d| !d.trim().is_empty()) {
        let guid = format!("{}#summary", channel.link);
        push_item(
            &mut out,
            &format!("{}: summary", channel.title),
            &channel.link,
            &guid,
            &build_date,
            digest,
        );
    }

    for item in items {
        let description = format!(
            "{} - {}",
            item.source,
            excerpt(item.best_summary(), DESCRIPTION_CHARS)
        );
        push_item(
            &mut out,
            &item.title,
            &item.url,
            &item.url,
            &rss_date(&item.published, now),
            &description,
        );
    }

    out.push_str("</channel>\n</rss>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap()
    }

    /// Parse the whole document and collect the text of every `tag` element.
    fn texts_of(xml: &str, tag: &[u8]) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut inside = false;
        let mut found = Vec::new();
        loop {
            match reader.read_event().expect("well-formed xml") {
                Event::Start(e) if e.name().as_ref() == tag => inside = true,
                Event::End(e) if e.name().as_ref() == tag => inside = false,
                Event::Text(t) if inside => found.push(t.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
        }
        found
    }

    #[test]
    fn escapes_markup_in_titles() {
        let item = Item::new("HN", "https://x/?a=1&b=2", "A & B <tag>", "", "say \"hi\"");
        let xml = render_rss(&ChannelConfig::default(), &[item], None, now());

        assert!(xml.contains("<title>A &amp; B &lt;tag&gt;</title>"));
        assert!(xml.contains("<link>https://x/?a=1&amp;b=2</link>"));
        assert!(xml.contains("&quot;hi&quot;"));

        let titles = texts_of(&xml, b"title");
        assert_eq!(titles, ["AI Research Digest", "A & B <tag>"]);
    }

    #[test]
    fn channel_metadata_and_dates() {
        let item = Item::new("arXiv", "https://x/1", "Paper", "2026-10-16T09:30:00+00:00", "");
        let undated = Item::new("arXiv", "https://x/2", "Undated", "", "");
        let xml = render_rss(&ChannelConfig::default(), &[item, undated], None, now());

        assert_eq!(texts_of(&xml, b"lastBuildDate"), ["Sat, 17 Oct 2026 08:00:00 +0000"]);
        assert_eq!(
            texts_of(&xml, b"pubDate"),
            ["Fri, 16 Oct 2026 09:30:00 +0000", "Sat, 17 Oct 2026 08:00:00 +0000"]
        );
        assert!(xml.contains("rel=\"self\""));
        assert_eq!(texts_of(&xml, b"guid"), ["https://x/1", "https://x/2"]);
    }

    #[test]
    fn digest_pseudo_item_leads_the_feed() {
        let mut item = Item::new("arXiv", "https://x/1", "Paper", "", "raw");
        item.ai_summary = Some("generated".into());
        let xml = render_rss(&ChannelConfig::default(), &[item], Some("Today: agents."), now());

        let guids = texts_of(&xml, b"guid");
        assert_eq!(guids, ["https://example.com/#summary", "https://x/1"]);
        let descriptions = texts_of(&xml, b"description");
        assert_eq!(
            descriptions,
            ["Curated AI research + releases", "Today: agents.", "arXiv - generated"]
        );
    }

    #[test]
    fn blank_digest_is_omitted() {
        let xml = render_rss(&ChannelConfig::default(), &[], Some("  "), now());
        assert!(texts_of(&xml, b"guid").is_empty());
    }
}
