use maud::{Markup, Render, html};

pub const INPUT_CLASSES: &str = "shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";

pub fn render_nav() -> Markup {
    const LINKS: [(&str, &str); 6] = [
        ("/", "Students"),
        ("/teachers", "Teachers"),
        ("/courses", "Courses"),
        ("/add", "Add Student"),
        ("/add-teacher", "Add Teacher"),
        ("/add-course", "Add Course"),
    ];

    html! {
        nav class="w-full max-w-4xl flex flex-row space-x-4 justify-center bg-gray-800 rounded shadow-md p-4" {
            @for (href, name) in LINKS {
                a href=(href) class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {(name)}
            }
        }
    }
}

pub fn render_table<const N: usize>(
    overall_title: impl Render,
    titles: [&'static str; N],
    items: Vec<[Markup; N]>,
) -> Markup {
    html! {
        div class="container mx-auto max-w-4xl" {
            (title(overall_title))
            div class="overflow-x-auto" {
                table class="min-w-full bg-gray-800 rounded shadow-md" {
                    thead class="bg-gray-700" {
                        tr {
                            @for title in titles {
                                th class="py-2 px-4 text-left font-semibold text-gray-300" {(title)}
                            }
                        }
                    }
                    tbody {
                        @if items.is_empty() {
                            tr {
                                td colspan=(N) class="py-2 px-4 italic text-gray-400" {"Nothing here yet."}
                            }
                        }
                        @for row in items {
                            tr {
                                @for col in row {
                                    td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(col)}
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn form_element(id: &'static str, label: &'static str, element: Markup) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class="block text-sm font-bold mb-2 text-gray-300" {(label)}
            (element)
        }
    }
}

pub fn simple_form_element(
    id: &'static str,
    label: &'static str,
    required: bool,
    input_type: Option<&'static str>,
    value: Option<&str>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            input required[required] type=(input_type.unwrap_or("text")) id=(id) name=(id) value=[value] class=(INPUT_CLASSES) {}
        },
    )
}

/// A `<select>` over `(id, label)` pairs, with `selected` pre-chosen and an optional blank first entry.
pub fn select_element(
    id: &'static str,
    label: &'static str,
    blank: Option<&'static str>,
    options: impl IntoIterator<Item = (i64, String)>,
    selected: Option<i64>,
) -> Markup {
    form_element(
        id,
        label,
        html! {
            select id=(id) name=(id) class=(INPUT_CLASSES) {
                @if let Some(blank) = blank {
                    option value="" {(blank)}
                }
                @for (option_id, option_label) in options {
                    option value=(option_id) selected[selected == Some(option_id)] {(option_label)}
                }
            }
        },
    )
}

pub fn form_submit_button(text: Option<&str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}

pub fn link_button(href: &str, text: &'static str, danger: bool) -> Markup {
    let colours = if danger {
        "bg-red-600 hover:bg-red-800"
    } else {
        "bg-blue-600 hover:bg-blue-800"
    };

    html! {
        a href=(href) class={"font-bold py-1 px-3 rounded mr-2 " (colours)} {(text)}
    }
}

pub fn card(markup: Markup) -> Markup {
    html! {
        div class="bg-gray-800 shadow-md rounded px-8 pt-6 pb-8 mb-4 w-full max-w-md" {
            (markup)
        }
    }
}
