//! GetCapabilities XML → [`CapabilityDocument`].
//!
//! Handles WMS 1.1.1 (`WMT_MS_Capabilities`, usually with a DOCTYPE) and
//! 1.3.0 (`WMS_Capabilities`, namespaced). Elements are matched on their
//! local name so the namespace prefix does not matter.

use crate::domain::model::{BoundingBox, CapabilityDocument, LayerNode};
use crate::utils::error::{GeneratorError, Result};
use roxmltree::{Document, Node, ParsingOptions};

pub fn parse_capabilities(xml: &str, requested_version: &str) -> Result<CapabilityDocument> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    match root.tag_name().name() {
        "WMT_MS_Capabilities" | "WMS_Capabilities" => {}
        "ServiceExceptionReport" => {
            return Err(GeneratorError::ServiceException {
                message: service_exception_text(root),
            })
        }
        other => {
            return Err(GeneratorError::InvalidCapabilitiesError {
                message: format!("unexpected root element <{}>", other),
            })
        }
    }

    let version = root
        .attribute("version")
        .unwrap_or(requested_version)
        .to_string();
    let service_title = child(root, "Service").and_then(|service| child_text(service, "Title"));
    let layer = child(root, "Capability")
        .and_then(|capability| child(capability, "Layer"))
        .ok_or_else(|| GeneratorError::InvalidCapabilitiesError {
            message: "document has no Capability/Layer element".to_string(),
        })?;

    let root_layer = parse_layer(layer, None)?;
    tracing::debug!(
        "Parsed WMS {} capabilities with {} named layers",
        version,
        root_layer.named_layer_count()
    );

    Ok(CapabilityDocument {
        version,
        service_title,
        root: root_layer,
    })
}

/// A layer without its own geographic box inherits the parent's.
fn parse_layer(node: Node, inherited: Option<BoundingBox>) -> Result<LayerNode> {
    let name = child_text(node, "Name");
    let title = child_text(node, "Title");
    let bbox = wgs84_bbox(node)?.or(inherited);

    let children = node
        .children()
        .filter(|c| is_element(c, "Layer"))
        .map(|c| parse_layer(c, bbox))
        .collect::<Result<Vec<_>>>()?;

    if children.is_empty() {
        Ok(LayerNode::Leaf { name, title, bbox })
    } else {
        Ok(LayerNode::Group {
            name,
            title,
            children,
        })
    }
}

fn wgs84_bbox(node: Node) -> Result<Option<BoundingBox>> {
    if let Some(b) = child(node, "LatLonBoundingBox") {
        let attr = |key: &str| parse_coordinate(b.attribute(key), key);
        return Ok(Some(BoundingBox::new(
            attr("minx")?,
            attr("miny")?,
            attr("maxx")?,
            attr("maxy")?,
        )));
    }

    if let Some(b) = child(node, "EX_GeographicBoundingBox") {
        let text = |key: &str| parse_coordinate(child(b, key).and_then(|n| n.text()), key);
        return Ok(Some(BoundingBox::new(
            text("westBoundLongitude")?,
            text("southBoundLatitude")?,
            text("eastBoundLongitude")?,
            text("northBoundLatitude")?,
        )));
    }

    Ok(None)
}

fn parse_coordinate(raw: Option<&str>, key: &str) -> Result<f64> {
    let raw = raw.map(str::trim).unwrap_or_default();
    raw.parse::<f64>()
        .map_err(|_| GeneratorError::InvalidCapabilitiesError {
            message: format!("bounding box value {} is not a number: '{}'", key, raw),
        })
}

fn service_exception_text(report: Node) -> String {
    let messages: Vec<String> = report
        .descendants()
        .filter(|n| is_element(n, "ServiceException"))
        .map(|n| {
            let text = n.text().map(str::trim).unwrap_or_default();
            match n.attribute("code") {
                Some(code) => format!("{}: {}", code, text),
                None => text.to_string(),
            }
        })
        .collect();

    if messages.is_empty() {
        "server returned an empty exception report".to_string()
    } else {
        messages.join("; ")
    }
}

fn is_element(node: &Node, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

fn child<'a, 'input>(node: Node<'a, 'input>, local_name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is_element(c, local_name))
}

fn child_text(node: Node, local_name: &str) -> Option<String> {
    child(node, local_name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WMS_111: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE WMT_MS_Capabilities SYSTEM "http://schemas.opengis.net/wms/1.1.1/WMS_MS_Capabilities.dtd">
<WMT_MS_Capabilities version="1.1.1">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>Topografisk norgeskart</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>Norgeskart</Title>
      <LatLonBoundingBox minx="-5.0" miny="58.0" maxx="31.0" maxy="71.0"/>
      <Layer>
        <Name>fylker</Name>
        <Title>Fylker</Title>
        <LatLonBoundingBox minx="4.5" miny="57.9" maxx="31.2" maxy="71.2"/>
      </Layer>
      <Layer>
        <Title>Samferdsel</Title>
        <Layer>
          <Name>veger</Name>
          <Title>Veger</Title>
        </Layer>
        <Layer>
          <Name>jernbane</Name>
          <Title>Jernbane</Title>
        </Layer>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    const WMS_130: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms">
  <Service><Name>WMS</Name><Title>Sjøkart</Title></Service>
  <Capability>
    <Layer>
      <Title>Sjøkart</Title>
      <Layer>
        <Name>dybdedata</Name>
        <Title>Dybdedata</Title>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>-5.0</westBoundLongitude>
          <eastBoundLongitude>31.0</eastBoundLongitude>
          <southBoundLatitude>58.0</southBoundLatitude>
          <northBoundLatitude>71.0</northBoundLatitude>
        </EX_GeographicBoundingBox>
      </Layer>
      <Layer>
        <Name>kystkontur</Name>
        <Title>Kystkontur</Title>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

    fn find<'a>(node: &'a LayerNode, name: &str) -> Option<&'a LayerNode> {
        if node.name() == Some(name) {
            return Some(node);
        }
        node.children().iter().find_map(|child| find(child, name))
    }

    #[test]
    fn test_parse_111_nested_tree() {
        let doc = parse_capabilities(WMS_111, "1.1.1").unwrap();

        assert_eq!(doc.version, "1.1.1");
        assert_eq!(doc.service_title.as_deref(), Some("Topografisk norgeskart"));
        assert_eq!(doc.root.title(), Some("Norgeskart"));
        assert_eq!(doc.root.name(), None);
        assert_eq!(doc.layer_count(), 3);

        let top = doc.top_level_layers();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name(), Some("fylker"));
        assert!(matches!(top[1], LayerNode::Group { .. }));
        let roads: Vec<_> = top[1].children().iter().filter_map(|c| c.name()).collect();
        assert_eq!(roads, vec!["veger", "jernbane"]);
    }

    #[test]
    fn test_bbox_own_and_inherited() {
        let doc = parse_capabilities(WMS_111, "1.1.1").unwrap();

        match find(&doc.root, "fylker").unwrap() {
            LayerNode::Leaf { bbox, .. } => {
                assert_eq!(*bbox, Some(BoundingBox::new(4.5, 57.9, 31.2, 71.2)))
            }
            other => panic!("expected leaf, got {:?}", other),
        }
        match find(&doc.root, "veger").unwrap() {
            LayerNode::Leaf { bbox, .. } => {
                assert_eq!(*bbox, Some(BoundingBox::new(-5.0, 58.0, 31.0, 71.0)))
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_130_namespaced() {
        let doc = parse_capabilities(WMS_130, "1.3.0").unwrap();

        assert_eq!(doc.version, "1.3.0");
        assert_eq!(doc.service_title.as_deref(), Some("Sjøkart"));
        assert_eq!(doc.layer_count(), 2);
        match find(&doc.root, "dybdedata").unwrap() {
            LayerNode::Leaf { bbox, .. } => {
                assert_eq!(*bbox, Some(BoundingBox::new(-5.0, 58.0, 31.0, 71.0)))
            }
            other => panic!("expected leaf, got {:?}", other),
        }
        match find(&doc.root, "kystkontur").unwrap() {
            LayerNode::Leaf { bbox, .. } => assert_eq!(*bbox, None),
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_service_exception_report() {
        let xml = r#"<?xml version="1.0"?>
<ServiceExceptionReport version="1.1.1">
  <ServiceException code="InvalidFormat">Unknown version</ServiceException>
</ServiceExceptionReport>"#;

        let err = parse_capabilities(xml, "1.1.1").unwrap_err();
        assert!(matches!(err, GeneratorError::ServiceException { .. }));
        assert!(err.to_string().contains("InvalidFormat: Unknown version"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_capabilities("<WMT_MS_Capabilities>", "1.1.1"),
            Err(GeneratorError::XmlError(_))
        ));
        assert!(matches!(
            parse_capabilities("<html><body>Down</body></html>", "1.1.1"),
            Err(GeneratorError::InvalidCapabilitiesError { .. })
        ));
        assert!(matches!(
            parse_capabilities(
                r#"<WMT_MS_Capabilities version="1.1.1"><Capability/></WMT_MS_Capabilities>"#,
                "1.1.1"
            ),
            Err(GeneratorError::InvalidCapabilitiesError { .. })
        ));
    }

    #[test]
    fn test_bad_bbox_number() {
        let xml = r#"<WMT_MS_Capabilities version="1.1.1"><Capability><Layer>
            <Name>a</Name><Title>A</Title>
            <LatLonBoundingBox minx="west" miny="58" maxx="31" maxy="71"/>
        </Layer></Capability></WMT_MS_Capabilities>"#;

        let err = parse_capabilities(xml, "1.1.1").unwrap_err();
        assert!(err.to_string().contains("minx"));
    }
}
