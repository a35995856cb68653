/// Builds a [`crate::chain::Entry`] from a key and a value
macro_rules! entry {
    ( $key: expr, $value: expr ) => {
        $crate::chain::Entry {
            key: $key,
            value: $value,
        }
    };
}
