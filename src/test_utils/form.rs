use scraper::{ElementRef, Html, Selector};

fn selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|error| panic!("Invalid selector {selector}: {error}"))
}

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form"))
        .next()
        .expect("No form found")
}

/// Check that `form` sends its request to `endpoint` through the htmx `attribute`,
/// e.g. `hx-post`.
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let Some(got) = form.value().attr(attribute) else {
        panic!("{attribute} attribute missing from form");
    };

    assert_eq!(
        got, endpoint,
        "want form with {attribute}=\"{endpoint}\", got {got:?}"
    );
}

/// Check that `form` has a required input called `name` of the given type.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = form
        .select(&selector(&format!("input[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));

    let got_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(
        got_type, type_,
        "want input {name} with type \"{type_}\", got {got_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to be required"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    assert!(
        form.select(&selector("button[type=\"submit\"]")).next().is_some(),
        "want a button with type=\"submit\""
    );
}
