/// Collapse whitespace runs to single spaces, trim, and cap at `max_chars`.
pub fn clean_text(raw: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(raw.len().min(max_chars * 4));
    let mut count = 0usize;

    for word in raw.split_whitespace() {
        if count > 0 {
            if count == max_chars {
                break;
            }
            out.push(' ');
            count += 1;
        }
        for c in word.chars() {
            if count == max_chars {
                break;
            }
            out.push(c);
            count += 1;
        }
        if count == max_chars {
            break;
        }
    }

    // A cap landing right after a separator leaves a trailing space
    if out.ends_with(' ') {
        out.pop();
    }
    out
}
