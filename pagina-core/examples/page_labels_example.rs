//! Example demonstrating custom page numbering with page labels

use pagina::page_labels::{parse_page_label_spec, PageLabel, PageLabelTree};
use pagina::writer::object_to_string;
use pagina::{Dictionary, Document, Object, Result};

fn main() -> Result<()> {
    // Cover page, preface in lowercase roman, then the main matter
    let spec = "/Cover/_1r_5D";
    let tree = parse_page_label_spec(spec)?;
    print_labels(spec, &tree, 10);

    // The same tree built in code
    let mut built = PageLabelTree::new();
    built.add_range(0, PageLabel::prefix_only("Cover"));
    built.add_range(1, PageLabel::roman_lowercase());
    built.add_range(5, PageLabel::decimal());
    assert_eq!(built, tree);

    // Appendix pages "A-1", "A-2", ...
    let appendix = parse_page_label_spec("D_20D/A-/")?;
    print_labels("D_20D/A-/", &appendix, 23);

    // Store the labels in a small document
    let mut doc = Document::from_reader(std::io::Cursor::new(minimal_document()))?;
    doc.set_page_labels(tree.to_dict())?;
    doc.set_info_creator()?;
    doc.save("page_labels_example.pdf")?;
    println!("Saved page_labels_example.pdf");

    Ok(())
}

fn print_labels(spec: &str, tree: &PageLabelTree, pages: u32) {
    println!("{spec}");
    println!("  {}", object_to_string(&Object::Dictionary(tree.to_dict())));
    println!("  {}", tree.get_all_labels(pages).join(" "));
}

/// One catalog object and nothing else
fn minimal_document() -> Vec<u8> {
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name("Catalog".to_string()));
    let body = format!(
        "1 0 obj\n{}\nendobj\n",
        object_to_string(&Object::Dictionary(catalog))
    );

    let header = "%PDF-1.7\n";
    let xref = header.len() + body.len();
    format!(
        "{header}{body}xref\n0 2\n0000000000 65535 f \n{:010} 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        header.len()
    )
    .into_bytes()
}
