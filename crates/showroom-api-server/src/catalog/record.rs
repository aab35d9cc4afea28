use csv::StringRecord;

use super::LoadError;

/// Column order of the inventory feed. CSV, UTF-8, comma-delimited, one
/// header row (skipped). Numeric cells are lenient (a dirty cell degrades
/// to 0); a wrong column count fails the whole load.
pub const EXPECTED_COLUMNS: usize = 12;

/// One vehicle for sale. The embedding is kept next to the record inside
/// the index, not here, so copies stored per session stay small.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub stock_id: String,
    pub km: u32,
    pub price: f64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub version: String,
    pub bluetooth: bool,
    pub car_play: bool,
    pub length_m: f64,
    pub width_m: f64,
    pub height_m: f64,
}

impl Vehicle {
    /// Parse one CSV record. `row` is the zero-based data row index, used
    /// only for error reporting.
    ///
    /// Feed columns: stock_id, km, price, make, model, year, version,
    /// bluetooth, length, width, height, car_play.
    pub fn from_record(row: usize, record: &StringRecord) -> Result<Self, LoadError> {
        if record.len() != EXPECTED_COLUMNS {
            return Err(LoadError::ColumnCount {
                row,
                expected: EXPECTED_COLUMNS,
                found: record.len(),
            });
        }

        Ok(Self {
            stock_id: record[0].trim().to_string(),
            km: lenient_parse(&record[1]),
            price: lenient_parse(&record[2]),
            make: record[3].trim().to_string(),
            model: record[4].trim().to_string(),
            year: lenient_parse(&record[5]),
            version: record[6].trim().to_string(),
            bluetooth: parse_flag(&record[7]),
            length_m: lenient_parse(&record[8]),
            width_m: lenient_parse(&record[9]),
            height_m: lenient_parse(&record[10]),
            car_play: parse_flag(&record[11]),
        })
    }

    /// Text handed to the embedding provider for this record: make, model,
    /// version, year, rounded price, mileage — in that order,
    /// space-separated. The text itself is never retained.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {} {} ${:.0} {} km",
            self.make, self.model, self.version, self.year, self.price, self.km
        )
    }

    /// One-line description used in recommendation blocks.
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} ({}) – Precio: {:.2} MXN, Kilometraje: {} km",
            self.make, self.model, self.version, self.year, self.price, self.km
        )
    }
}

fn lenient_parse<T: std::str::FromStr + Default>(cell: &str) -> T {
    cell.trim().parse().unwrap_or_default()
}

fn parse_flag(cell: &str) -> bool {
    matches!(
        cell.trim().to_lowercase().as_str(),
        "sí" | "si" | "yes" | "true" | "1"
    )
}
