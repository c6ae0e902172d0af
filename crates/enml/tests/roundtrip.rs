use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use enml::{
    parse_xml, to_markup_format, to_storage_format, ConvertOptions, Error, FileBackedResolver,
    Matcher, Resource, ResourceResolver,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Resolver that maps every reference to a locator carrying hash, type and
/// nothing else, so the original reference can be read back from the output.
struct EchoResolver;

impl ResourceResolver for EchoResolver {
    fn resolve(&self, hash: &str, mime: &str) -> enml::Result<String> {
        Ok(format!("res://{mime}/{hash}"))
    }
}

fn media_set(html: &str) -> HashSet<(String, String, Option<String>)> {
    let tree = enml::parse_html(html).unwrap();
    tree.find_all(&Matcher::tag("img"))
        .into_iter()
        .map(|img| {
            let src = tree.attr(img, "src").unwrap();
            let rest = src.strip_prefix("res://").unwrap();
            let (mime, hash) = rest.rsplit_once('/').unwrap();
            (
                hash.to_string(),
                mime.to_string(),
                tree.attr(img, "alt").map(str::to_string),
            )
        })
        .collect()
}

fn checked_states(html: &str) -> Vec<Option<String>> {
    let tree = enml::parse_html(html).unwrap();
    tree.find_all(&Matcher::tag_with_attr("input", "type", "checkbox"))
        .into_iter()
        .map(|input| tree.attr(input, "checked").map(str::to_string))
        .collect()
}

#[test]
fn round_trip_preserves_todos_and_media() {
    let resources = vec![
        Resource::new("aa11", "image/png").with_alt("diagram"),
        Resource::new("bb22", "image/jpeg"),
    ];
    let html = r#"<html><body>
        <p><input type="checkbox" checked="checked"> first</p>
        <p><input type="checkbox"> second</p>
        <p><input type="checkbox" checked="yes"> third</p>
        <img src="/r/aa11.png" alt="diagram"><img src="/r/bb22.jpg">
    </body></html>"#;

    let enml = to_storage_format(html, &ConvertOptions::default().with_resources(resources))
        .unwrap();
    let back = to_markup_format(
        &enml,
        false,
        &ConvertOptions::default().with_resolver(EchoResolver),
    )
    .unwrap();

    assert_eq!(
        checked_states(&back),
        vec![Some("checked".to_string()), None, Some("yes".to_string())]
    );

    let expected: HashSet<_> = [
        ("aa11".to_string(), "image/png".to_string(), Some("diagram".to_string())),
        ("bb22".to_string(), "image/jpeg".to_string(), None),
    ]
    .into_iter()
    .collect();
    assert_eq!(media_set(&back), expected);
}

#[test]
fn denylisted_tags_never_reach_storage() {
    let html = r#"<body>
        <applet></applet><button>b</button><embed src="x"><fieldset><legend>l</legend></fieldset>
        <form><label>x</label><select><optgroup><option>o</option></optgroup></select>
        <textarea>t</textarea></form><iframe></iframe><marquee>m</marquee><menu></menu>
        <noscript>n</noscript><object><param name="a"></object><script>s()</script>
        <style>p{}</style><p>kept</p></body>"#;

    let enml = to_storage_format(html, &ConvertOptions::default()).unwrap();
    let tree = parse_xml(&enml).unwrap();

    for tag in enml::tables::PROHIBITED_ELEMENTS {
        assert!(
            tree.find_all(&Matcher::tag(tag)).is_empty(),
            "<{tag}> survived in {enml}"
        );
        assert!(
            tree.find_all(&Matcher::has_attr(tag)).is_empty(),
            "{tag}= survived in {enml}"
        );
    }
    assert!(enml.contains("<p>kept</p>"));
}

#[test]
fn checked_value_is_not_normalized() {
    let enml = to_storage_format(
        r#"<input type="checkbox" checked="checked">"#,
        &ConvertOptions::default(),
    )
    .unwrap();
    assert!(enml.contains(r#"<en-todo checked="checked"/>"#));

    let enml = to_storage_format(r#"<input type="checkbox">"#, &ConvertOptions::default())
        .unwrap();
    assert!(enml.contains("<en-todo/>"));
}

#[test]
fn resolver_locator_becomes_src() {
    struct Fixed;
    impl ResourceResolver for Fixed {
        fn resolve(&self, hash: &str, mime: &str) -> enml::Result<String> {
            assert_eq!((hash, mime), ("abc123", "image/png"));
            Ok("file:///tmp/x.png".to_string())
        }
    }

    let html = to_markup_format(
        r#"<en-note><en-media hash="abc123" type="image/png"/></en-note>"#,
        false,
        &ConvertOptions::default().with_resolver(Fixed),
    )
    .unwrap();
    assert_eq!(html, r#"<html><body><img src="file:///tmp/x.png"></body></html>"#);
}

#[test]
fn file_backed_resolver_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let bodies: HashMap<&str, &[u8]> =
        [("abc123", b"png bytes".as_slice())].into_iter().collect();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let source = move |hash: &str| -> enml::Result<Vec<u8>> {
        counter.fetch_add(1, Ordering::SeqCst);
        bodies
            .get(hash)
            .map(|body| body.to_vec())
            .ok_or_else(|| Error::ResourceResolution {
                hash: hash.to_string(),
                reason: "unknown resource".to_string(),
            })
    };
    let options = ConvertOptions::default()
        .with_pretty(false)
        .with_resolver(FileBackedResolver::new(dir.path().join("media"), source));

    let enml = r#"<en-note><en-media hash="abc123" type="image/png"/><en-media hash="abc123" type="image/png"/></en-note>"#;
    let html = to_markup_format(enml, false, &options).unwrap();
    let html_again = to_markup_format(enml, false, &options).unwrap();

    assert_eq!(html, html_again);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(html.contains("abc123.png\""));
    assert_eq!(
        fs::read(dir.path().join("media").join("abc123.png")).unwrap(),
        b"png bytes"
    );

    let err = to_markup_format(
        r#"<en-note><en-media hash="ffff" type="image/png"/></en-note>"#,
        false,
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, Error::ResourceResolution { .. }));
}

#[test]
fn concurrent_resolves_write_one_complete_file() {
    init_tracing();
    const THREADS: usize = 8;
    let dir = tempfile::tempdir().unwrap();
    let body: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = body.clone();

    let source = move |_: &str| -> enml::Result<Vec<u8>> { Ok(body.clone()) };
    let resolver = Arc::new(FileBackedResolver::new(dir.path(), source));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resolver.resolve("cafe01", "image/gif")
            })
        })
        .collect();

    let locators: HashSet<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert_eq!(locators.len(), 1);
    assert_eq!(fs::read(dir.path().join("cafe01.gif")).unwrap(), expected);
    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1, "temporary files were left behind");
}

#[test]
fn unknown_mime_type_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = FileBackedResolver::new(dir.path(), |_: &str| -> enml::Result<Vec<u8>> {
        Ok(Vec::new())
    });
    assert!(matches!(
        resolver.resolve("abc123", "image/bmp"),
        Err(Error::UnsupportedMimeType(_))
    ));
}

#[test]
fn malformed_input_is_a_parse_error_in_both_directions() {
    let options = ConvertOptions::default();
    assert!(matches!(
        to_storage_format(b"<p>\xc3\x28</p>".as_slice(), &options),
        Err(Error::Parse(_))
    ));
    assert!(matches!(
        to_markup_format(b"<en-note>\xc3\x28</en-note>".as_slice(), false, &options),
        Err(Error::Parse(_))
    ));
    assert!(matches!(
        to_markup_format("<en-note><p>unterminated", false, &options),
        Err(Error::Parse(_))
    ));
}

#[test]
fn lenient_html_is_accepted() {
    let enml = to_storage_format("<p>one<p>two<b>bold", &ConvertOptions::default()).unwrap();
    assert!(enml.ends_with("<en-note><p>one</p><p>two<b>bold</b></p></en-note>"));
}
