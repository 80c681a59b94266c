//! GeoJSON point features and Leaflet maps from datastore records.

use datagov_il_ckan::models::Record;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DataGovError, Result};
use crate::profile::parse_number;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Coordinates in GeoJSON order: `[longitude, latitude]`
    Point { coordinates: [f64; 2] },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Record,
}

impl Feature {
    pub fn point(lat: f64, lon: f64, properties: Record) -> Self {
        Self {
            geometry: Geometry::Point {
                coordinates: [lon, lat],
            },
            properties,
        }
    }

    pub fn lat(&self) -> f64 {
        let Geometry::Point { coordinates } = &self.geometry;
        coordinates[1]
    }

    pub fn lon(&self) -> f64 {
        let Geometry::Point { coordinates } = &self.geometry;
        coordinates[0]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
}

/// Feature collection with its centroid; never empty
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeatures {
    pub collection: FeatureCollection,
    pub centroid: Centroid,
}

/// Map output: GeoJSON, a Leaflet page, point count and map center
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapArtifact {
    pub geojson: FeatureCollection,
    pub html: String,
    pub point_count: usize,
    pub center: Centroid,
}

/// Read a coordinate, rejecting unparsable, non-finite and zero values.
///
/// Zero is the portal's placeholder for a missing coordinate.
pub fn coordinate(value: Option<&Value>) -> Option<f64> {
    value
        .and_then(parse_number)
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Turn up to `limit` records into point features.
///
/// Records without a valid latitude and longitude are skipped; the two
/// coordinate fields are removed from each feature's properties.
///
/// # Errors
///
/// [`DataGovError::NoValidCoordinates`] when no record survives.
pub fn build_features(
    records: &[Record],
    lat_field: &str,
    lon_field: &str,
    limit: usize,
) -> Result<GeoFeatures> {
    let features: Vec<Feature> = records
        .iter()
        .take(limit)
        .filter_map(|record| {
            let lat = coordinate(record.get(lat_field))?;
            let lon = coordinate(record.get(lon_field))?;
            let properties = record
                .iter()
                .filter(|(key, _)| key.as_str() != lat_field && key.as_str() != lon_field)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Some(Feature::point(lat, lon, properties))
        })
        .collect();

    if features.is_empty() {
        return Err(DataGovError::NoValidCoordinates);
    }

    let count = features.len() as f64;
    let centroid = Centroid {
        lat: features.iter().map(Feature::lat).sum::<f64>() / count,
        lon: features.iter().map(Feature::lon).sum::<f64>() / count,
    };

    Ok(GeoFeatures {
        collection: FeatureCollection { features },
        centroid,
    })
}

/// Build features and render them on a Leaflet map centered on the centroid
pub fn map_artifact(
    records: &[Record],
    lat_field: &str,
    lon_field: &str,
    limit: usize,
) -> Result<MapArtifact> {
    let GeoFeatures {
        collection,
        centroid,
    } = build_features(records, lat_field, lon_field, limit)?;
    let html = render_map_html(&collection, centroid)?;

    Ok(MapArtifact {
        point_count: collection.features.len(),
        geojson: collection,
        html,
        center: centroid,
    })
}

/// Standalone HTML page showing the features over OpenStreetMap tiles
pub fn render_map_html(collection: &FeatureCollection, center: Centroid) -> Result<String> {
    let geojson = crate::html::script_json(collection)?;
    let Centroid { lat, lon } = center;
    Ok(format!(
        r#"
<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    #map {{ height: 600px; width: 100%; }}
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    var map = L.map('map').setView([{lat}, {lon}], 10);
    L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
      attribution: '© OpenStreetMap contributors'
    }}).addTo(map);

    var geojson = {geojson};
    L.geoJSON(geojson, {{
      onEachFeature: function(feature, layer) {{
        if (feature.properties) {{
          var popup = Object.entries(feature.properties)
            .map(([k,v]) => `<b>${{k}}</b>: ${{v}}`)
            .join('<br>');
          layer.bindPopup(popup);
        }}
      }}
    }}).addTo(map);
  </script>
</body>
</html>
"#
    ))
}
