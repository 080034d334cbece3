//! Assertions and parsers shared by the handler and page tests.

#![allow(missing_docs)]

mod form;
mod request;
mod response;

pub(crate) use form::{
    assert_form_input, assert_form_input_with_value, assert_form_submit_button,
    assert_hx_endpoint, must_get_form, selected_option_value,
};
pub(crate) use request::{extract_form, extract_query};
pub(crate) use response::{
    assert_content_type, assert_hx_redirect, assert_status_ok, assert_valid_html,
    parse_html_document, parse_html_fragment, parse_json,
};
