use solicitud_contract::DocumentSlot;

use crate::notifications::escape_html;

const TEMPLATE: &str = include_str!("../assets/intake_form.html");

/// Renders the intake page. File inputs come from [`DocumentSlot::ALL`], two
/// per row, so the page and the handler agree on field names.
pub fn render_intake_form(submit_path: &str) -> String {
    let rows: String = DocumentSlot::ALL
        .chunks(2)
        .map(|pair| {
            let groups: String = pair.iter().map(|slot| file_input(*slot)).collect();
            format!("        <div class=\"form-row\">\n{groups}        </div>\n")
        })
        .collect();

    TEMPLATE
        .replace("{{submit_path}}", &escape_html(submit_path))
        .replace("{{file_rows}}", rows.trim_end_matches('\n'))
}

fn file_input(slot: DocumentSlot) -> String {
    let name = slot.field_name();
    format!(
        "          <div class=\"form-group\">\n\
         \x20           <label for=\"{name}\">{label}:</label>\n\
         \x20           <input id=\"{name}\" name=\"{name}\" type=\"file\" accept=\"{accept}\" required>\n\
         \x20         </div>\n",
        label = slot.form_label(),
        accept = slot.kind().accept_hint(),
    )
}
