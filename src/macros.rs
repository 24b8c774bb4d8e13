// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand!

    // Zero-arg → String::new()
    () => {
        ::std::string::String::new()
    };
    // Any single expression — works for literals, consts, or vars
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! fields {
    // Field table shorthand: `"json_key" => "Page label"`, optionally
    // followed by `[Strategy, ...]` to override the default lookup order.
    (@strategies) => { None };
    (@strategies [$($strategy:ident),+]) => {
        Some(vec![$($crate::specs::fields::Strategy::$strategy),+])
    };
    ($($key:literal => $label:literal $([$($strategy:ident),+ $(,)?])?),+ $(,)?) => {
        vec![
            $(
                $crate::specs::fields::FieldSpec {
                    key: $crate::s!($key),
                    label: $crate::s!($label),
                    strategies: $crate::fields!(@strategies $([$($strategy),+])?),
                },
            )+
        ]
    };
}
