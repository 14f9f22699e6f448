use placeholder_svg::assets::AssetOrigin;
use placeholder_svg::config::PlaceholderConfig;
use placeholder_svg::services::PlaceholderService;
use placeholder_svg::svg::SecureXmlParser;
use placeholder_svg::svg::template::LOGO_MARKER;
use proptest::prelude::*;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::Write;
use std::num::NonZeroUsize;

const TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="${width}" height="${height}" viewBox="0 0 ${width} ${height}">
  <rect x="0" y="0" fill="#dde3ea"/>
  <g transform="translate(${positionX} ${positionY}) scale(${scalingFactor})">
    <g id="Logo"><text>replaced</text></g>
  </g>
</svg>"##;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="500" height="400"><path d="M0 0L500 400" stroke="#334455"/></svg>"##;

const LOGO_MARKUP: &str = r##"<path d="M0 0L500 400" stroke="#334455" xmlns="http://www.w3.org/2000/svg"/>"##;

/// Standalone well-formedness check: one root, balanced tags, no DOCTYPE,
/// and every reference in text or attributes resolvable without a DTD
fn check_well_formed(svg: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(svg);
    reader.config_mut().check_end_names = true;
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        if let Event::Start(tag) | Event::Empty(tag) = &event {
            if depth == 0 {
                roots += 1;
            }
            for attr in tag.attributes() {
                let attr = attr.map_err(|e| e.to_string())?;
                attr.unescape_value().map_err(|e| {
                    format!("attribute {}: {e}", String::from_utf8_lossy(attr.key.as_ref()))
                })?;
            }
        }
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.checked_sub(1).ok_or("unbalanced end tag")?,
            Event::GeneralRef(reference) => {
                let name = reference.decode().map_err(|e| e.to_string())?;
                if !reference.is_char_ref()
                    && !["amp", "lt", "gt", "quot", "apos"].contains(&&*name)
                {
                    return Err(format!("undefined entity &{name};"));
                }
            }
            Event::DocType(_) => return Err("unexpected DOCTYPE".to_string()),
            Event::Eof => break,
            _ => {}
        }
    }

    match (depth, roots) {
        (0, 1) => Ok(()),
        _ => Err(format!("{roots} root elements, {depth} unclosed")),
    }
}

fn service(logo: &str) -> PlaceholderService {
    PlaceholderService::from_sources(
        TEMPLATE,
        AssetOrigin::BuiltIn,
        logo,
        AssetOrigin::BuiltIn,
        NonZeroUsize::new(16).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_wide_canvas_end_to_end() {
    let svg = service(LOGO).render(1000, 200).unwrap();

    assert!(svg.contains(r#"width="1000" height="200" viewBox="0 0 1000 200""#));
    assert!(svg.contains("translate(437.5 50) scale(0.25)"));
    assert!(svg.contains(&format!(r#"<g id="Logo">{LOGO_MARKUP}</g>"#)));
    assert!(!svg.contains("replaced"));
    assert!(!svg.contains(LOGO_MARKER));
    assert_eq!(check_well_formed(&svg), Ok(()));
    assert!(SecureXmlParser::new().parse(&svg, false).is_ok());
}

#[test]
fn test_tall_canvas_end_to_end() {
    let svg = service(LOGO).render(200, 1000).unwrap();
    assert!(svg.contains("translate(50 460) scale(0.2)"));
}

#[test]
fn test_packaged_default_pipeline() {
    let service = PlaceholderService::from_config(&PlaceholderConfig::default()).unwrap();
    let svg = service.render(1280, 720).unwrap();

    // Packaged logo is 96x96: 360 px tall, centered
    assert!(svg.contains("translate(460 180) scale(3.75)"), "{svg}");
    assert!(svg.contains(r#"width="1280""#));
    assert_eq!(check_well_formed(&svg), Ok(()));
}

#[test]
fn test_external_entities_never_reach_the_output() {
    let mut secret = tempfile::NamedTempFile::new().unwrap();
    write!(secret, "top-secret-contents").unwrap();

    let logo = format!(
        r#"<?xml version="1.0"?>
<!DOCTYPE svg [
  <!ENTITY leak SYSTEM "file://{}">
  <!ENTITY remote SYSTEM "http://127.0.0.1:9/never.dtd">
]>
<svg width="10" height="10"><text>&leak;&remote;</text></svg>"#,
        secret.path().display()
    );

    let svg = service(&logo).render(100, 100).unwrap();
    assert!(!svg.contains("top-secret-contents"));
    assert!(svg.contains("<text></text>"));
    assert!(!svg.contains("DOCTYPE"));
}

#[test]
fn test_entities_in_logo_attributes_are_resolved() {
    // Illustrator-style export binding the namespace through an entity
    let logo = r##"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
  <!ENTITY ns_svg "http://www.w3.org/2000/svg">
  <!ENTITY red "#f00">
]>
<svg xmlns="&ns_svg;" width="10" height="10"><rect fill="&red;"/></svg>"##;

    let svg = service(logo).render(100, 100).unwrap();
    assert!(
        svg.contains(r##"<g id="Logo"><rect fill="#f00" xmlns="http://www.w3.org/2000/svg"/></g>"##),
        "{svg}"
    );
    assert_eq!(check_well_formed(&svg), Ok(()));
}

#[test]
fn test_external_entities_in_attributes_resolve_to_empty() {
    let logo = r#"<!DOCTYPE svg [
  <!ENTITY ext SYSTEM "file:///etc/passwd">
]>
<svg width="10" height="10"><rect fill="&ext;" stroke="&undeclared;" opacity="&#48;.5"/></svg>"#;

    let svg = service(logo).render(100, 100).unwrap();
    assert!(svg.contains(r#"<rect fill="" stroke="" opacity="&#48;.5"/>"#), "{svg}");
    assert_eq!(check_well_formed(&svg), Ok(()));
}

#[test]
fn test_well_formedness_check_rejects_dtd_dependent_output() {
    assert!(check_well_formed(r#"<svg><rect fill="&red;"/></svg>"#).is_err());
    assert!(check_well_formed("<svg><text>&red;</text></svg>").is_err());
    assert!(check_well_formed("<svg/><svg/>").is_err());
    assert_eq!(check_well_formed(r#"<svg a="&amp;&#169;">&lt;</svg>"#), Ok(()));
}

#[test]
fn test_template_doctype_is_not_carried_over() {
    let template = format!(
        r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">{}"#,
        r#"<svg width="${width}" height="${height}"><g transform="translate(${positionX} ${positionY}) scale(${scalingFactor})"><g id="Logo"/></g></svg>"#
    );
    let service = PlaceholderService::from_sources(
        &template,
        AssetOrigin::BuiltIn,
        LOGO,
        AssetOrigin::BuiltIn,
        NonZeroUsize::MIN,
    )
    .unwrap();

    let svg = service.render(20, 20).unwrap();
    assert!(!svg.contains("DOCTYPE"));
    assert!(svg.contains(r#"<svg width="20" height="20">"#));
}

#[test]
fn test_logo_from_file_in_inches() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"<svg width="2in" height="1in"><rect width="192" height="96"/></svg>"#).unwrap();

    let config = PlaceholderConfig {
        logo_path: Some(file.path().to_path_buf()),
        ..PlaceholderConfig::default()
    };
    let service = PlaceholderService::from_config(&config).unwrap();
    assert_eq!(service.sources().logo, AssetOrigin::File(file.path().to_path_buf()));
    assert_eq!(service.sources().logo_width, Some(192.0));
    assert_eq!(service.sources().logo_height, Some(96.0));

    let svg = service.render(1000, 384).unwrap();
    assert!(svg.contains("translate(308 96) scale(2)"), "{svg}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rendered_output_is_well_formed(width in 1u32..5000, height in 1u32..5000) {
        let service = service(LOGO);
        let svg = service.render(width, height).unwrap();

        prop_assert_eq!(check_well_formed(&svg), Ok(()));
        let width_attr = format!(r#"width="{width}""#);
        let height_attr = format!(r#"height="{height}""#);
        prop_assert_eq!(svg.matches(width_attr.as_str()).count(), 1);
        prop_assert_eq!(svg.matches(height_attr.as_str()).count(), 1);
        prop_assert_eq!(svg.matches(LOGO_MARKUP).count(), 1);
        prop_assert!(!svg.contains("${"), "output contains an unsubstituted ${{ placeholder");
        prop_assert!(!svg.contains(LOGO_MARKER));

        let again = service.render(width, height).unwrap();
        prop_assert_eq!(&*svg, &*again);
    }

    #[test]
    fn prop_logo_fits_within_half_the_canvas(width in 2u32..5000, height in 2u32..5000) {
        let service = service(LOGO);
        let request = placeholder_svg::svg::RenderRequest::new(width, height).unwrap();
        let geometry = service.renderer().geometry(request);

        prop_assert!(geometry.logo_height <= f64::from(height / 2) + 0.5);
        prop_assert!(geometry.scaling_factor >= 0.0);
        let drawn_width = geometry.scaling_factor * 500.0;
        prop_assert!((geometry.position_x * 2.0 + drawn_width - f64::from(width)).abs() < 1e-6);
    }
}
