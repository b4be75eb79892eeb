use pgscout_core::ListingRecord;

const HEADER: [&str; 5] = ["Categoria", "TermineRicerca", "Nome", "Indirizzo", "Telefono"];

/// Renders scrape results as CSV. The header row is always written, so an
/// empty result is a one-line file.
pub(super) fn render_csv(category: &str, items: &[ListingRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for item in items {
        let term = if item.term.is_empty() {
            category
        } else {
            item.term.as_str()
        };
        writer.write_record([
            category,
            term,
            item.name.as_str(),
            item.address.as_str(),
            item.phone.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
