/// DSL macro for building test histories.
///
/// Produces `Vec<Session<&'static str, u64>>`.
///
/// # Syntax
///
/// ```ignore
/// history! {
///     [
///         { w(x, 1), w(y, 1) },
///     ],
///     [
///         { r(x, 1), w(y, 2) },
///         { r(y, 2) },
///     ],
/// }
/// ```
///
/// - `w(var, val)` → `Event::write("var", val)`
/// - `r(var, val)` → `Event::read("var", val)`
///
/// Build a single Event.
#[macro_export]
macro_rules! ev {
    (w($var:ident, $val:expr)) => {
        veriso_core::history::Event::<&'static str, u64>::write(stringify!($var), $val as u64)
    };
    (r($var:ident, $val:expr)) => {
        veriso_core::history::Event::<&'static str, u64>::read(stringify!($var), $val as u64)
    };
}

/// Build a Transaction from its events.
#[macro_export]
macro_rules! txn {
    ($($e:ident($($args:tt)*)),* $(,)?) => {
        veriso_core::history::Transaction::<&'static str, u64>::new(
            vec![$($crate::ev!($e($($args)*))),*]
        )
    };
}

/// Build one Session from transaction blocks.
#[macro_export]
macro_rules! session {
    ($( { $($e:ident($($args:tt)*)),* $(,)? } ),* $(,)?) => {
        vec![$($crate::txn!($($e($($args)*)),*)),*]
    };
}

/// Build a full history: sessions are `[ ... ]` blocks.
#[macro_export]
macro_rules! history {
    ($( [ $($txns:tt)* ] ),* $(,)?) => {
        vec![
            $($crate::session!($($txns)*)),*
        ]
    };
}
