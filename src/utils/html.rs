/// Strips markup that could execute in a browser from user supplied text.
///
/// Contact messages are read back by staff in an HTML dashboard, so anything
/// stored from an anonymous sender goes through the ammonia whitelist first.
/// Safe formatting tags survive; `<script>` elements lose their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
