//! Map section: geographic points from `Latitude`/`Longitude` columns.

use crate::cells::numeric_values;
use polars::prelude::*;

pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const LOCATION: &str = "Location";

/// Shown when a table has place names but no coordinates. No geocoding is done.
pub const LOCATION_HINT: &str =
    "Convert the 'Location' column to Latitude/Longitude for map view support.";

#[derive(Debug, Clone)]
pub enum MapView {
    /// `Latitude` and `Longitude` as Float64, rows with a missing coordinate dropped.
    Points(DataFrame),
    LocationHint(String),
    Unavailable,
}

impl MapView {
    /// (longitude, latitude) pairs, ready to plot with longitude on x.
    pub fn coordinates(&self) -> PolarsResult<Vec<(f64, f64)>> {
        let Self::Points(df) = self else {
            return Ok(Vec::new());
        };
        let lat = numeric_values(df.column(LATITUDE)?.as_materialized_series())?;
        let lon = numeric_values(df.column(LONGITUDE)?.as_materialized_series())?;
        Ok(lon
            .into_iter()
            .zip(lat)
            .filter_map(|(lon, lat)| Some((lon?, lat?)))
            .collect())
    }
}

/// Build the map section for one refresh. Columns that cannot be read as
/// coordinates become a message instead of failing the refresh.
pub fn map_section(df: &DataFrame) -> Result<MapView, String> {
    map_view(df).map_err(|e| {
        tracing::warn!(error = %e, "map unavailable");
        format!("Could not read map coordinates: {}", e)
    })
}

pub fn map_view(df: &DataFrame) -> PolarsResult<MapView> {
    let has = |name: &str| df.column(name).is_ok();
    if has(LATITUDE) && has(LONGITUDE) {
        let lat = df.column(LATITUDE)?.cast(&DataType::Float64)?;
        let lon = df.column(LONGITUDE)?.cast(&DataType::Float64)?;
        let lat_values = numeric_values(lat.as_materialized_series())?;
        let lon_values = numeric_values(lon.as_materialized_series())?;
        let keep: Vec<bool> = lat_values
            .iter()
            .zip(&lon_values)
            .map(|(a, b)| a.is_some() && b.is_some())
            .collect();
        let points = DataFrame::new(vec![lat, lon])?
            .filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
        tracing::debug!(points = points.height(), "map points prepared");
        Ok(MapView::Points(points))
    } else if has(LOCATION) {
        Ok(MapView::LocationHint(LOCATION_HINT.to_string()))
    } else {
        Ok(MapView::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_drop_missing_rows() {
        let df = df!(
            "Name" => ["a", "b", "c"],
            "Latitude" => [Some(10.5f64), None, Some(11.0)],
            "Longitude" => [Some(76.2f64), Some(76.3), Some(76.4)]
        )
        .unwrap();
        let view = map_view(&df).unwrap();
        match &view {
            MapView::Points(points) => {
                assert_eq!(points.shape(), (2, 2));
            }
            other => panic!("expected points, got {:?}", other),
        }
        assert_eq!(view.coordinates().unwrap(), vec![(76.2, 10.5), (76.4, 11.0)]);
    }

    #[test]
    fn text_coordinates_are_parsed() {
        let df = df!("Latitude" => ["10.5", "x"], "Longitude" => ["76.2", "76.3"]).unwrap();
        match map_view(&df).unwrap() {
            MapView::Points(points) => assert_eq!(points.height(), 1),
            other => panic!("expected points, got {:?}", other),
        }
    }

    #[test]
    fn unreadable_coordinates_become_a_message() {
        let latitude = Series::new(
            LATITUDE.into(),
            [
                Series::new("".into(), [1.0f64]),
                Series::new("".into(), [2.0f64]),
            ],
        );
        let mut df = df!(LONGITUDE => [10.0f64, 11.0]).unwrap();
        df.with_column(latitude).unwrap();
        assert!(map_view(&df).is_err());
        assert!(matches!(
            map_section(&df),
            Err(ref msg) if msg.starts_with("Could not read map coordinates")
        ));
        let ok = df!(LATITUDE => [1.0f64], LONGITUDE => [2.0f64]).unwrap();
        assert!(matches!(map_section(&ok), Ok(MapView::Points(_))));
    }

    #[test]
    fn location_only_gives_a_hint() {
        let df = df!("Location" => ["Kochi"]).unwrap();
        assert!(matches!(map_view(&df).unwrap(), MapView::LocationHint(m) if m == LOCATION_HINT));
        let df = df!("Other" => [1i64]).unwrap();
        assert!(matches!(map_view(&df).unwrap(), MapView::Unavailable));
        assert!(MapView::Unavailable.coordinates().unwrap().is_empty());
    }
}
