//! Page scripts evaluated in the browser
//!
//! Every script is a self-invoking expression returning JSON-compatible data,
//! `null` when the element it reads is not on the page.

/// Number of listing pages; 1 for an unpaginated listing with items, 0 for none
pub const PAGE_COUNT_SCRIPT: &str = r#"
(() => {
    const links = document.querySelectorAll('.pagination a');
    if (links.length === 0) {
        return document.querySelector('.thumb a[href^="/game/"]') ? 1 : 0;
    }
    const last = Number(links[links.length - 1].innerText.trim());
    return Number.isFinite(last) && last > 0 ? last : 1;
})()
"#;

/// Item references of a listing page
pub const ITEM_LINKS_SCRIPT: &str = r#"
(() => Array.from(document.querySelectorAll('.thumb a[href^="/game/"]')).map((a) => {
    const name = (a.getAttribute('title') || a.innerText || '').trim();
    return { url: a.href, name: name.length > 0 ? name : null };
}))()
"#;

pub const NAME_SCRIPT: &str = r#"
(() => {
    const elem = document.querySelector('.box h2');
    return elem ? elem.textContent.trim() : null;
})()
"#;

/// `[label, value]` pairs of the info table
pub const META_SCRIPT: &str = r#"
(() => Array.from(document.querySelectorAll('.gameInfo tr'))
    .filter((row) => row.querySelector('th') && row.querySelector('td'))
    .map((row) => [row.querySelector('th').innerText.trim(), row.querySelector('td').innerText.trim()]))()
"#;

/// `[score, votes]` as displayed
pub const SCORE_SCRIPT: &str = r#"
(() => {
    const elem = document.querySelector('.gameRated');
    if (!elem || elem.children.length < 3) {
        return null;
    }
    return [elem.children[0].innerText.trim(), elem.children[2].innerText.trim()];
})()
"#;

pub const PLAY_ONLINE_SCRIPT: &str = r#"
(() => {
    const a = document.querySelector('.gamePlay a');
    return a ? a.href : null;
})()
"#;

/// Screenshot URLs keyed by platform name
pub const SCREENSHOTS_SCRIPT: &str = r#"
(() => {
    const result = {};
    const tabs = Array.from(document.querySelectorAll('#screentabs a'));
    if (tabs.length === 0) {
        const shots = Array.from(document.querySelectorAll('.items.screens .thumb a')).map((a) => a.href);
        if (shots.length > 0) {
            result['all'] = shots;
        }
        return result;
    }
    for (const tab of tabs) {
        const id = tab.dataset.platform;
        const selector = `.items.screens[data-platform="${id}"] .thumb a`;
        result[tab.innerText.trim()] = Array.from(document.querySelectorAll(selector)).map((a) => a.href);
    }
    return result;
})()
"#;

/// Description HTML, long format first, single paragraph format second
pub const DESCRIPTION_SCRIPT: &str = r#"
(() => {
    const long = document.querySelector('.gameDescription.dscr');
    if (long) {
        return long.innerHTML.trim();
    }
    const heading = document.querySelector('#content h3.cBoth');
    if (heading && heading.parentElement.children.length > 1) {
        return heading.parentElement.children[1].innerHTML.trim();
    }
    return null;
})()
"#;

/// Download links with the platform section they belong to
///
/// Sections are a `.platformDownload` header optionally followed by a
/// `.platformMeta` list, then `.buttons` holding the links themselves.
pub const DOWNLOAD_LINKS_SCRIPT: &str = r#"
(() => {
    const languagesOf = (elem) => Array.from(elem.querySelectorAll('span img'))
        .map((img) => /([^/.]+)\.gif$/.exec(img.src))
        .filter((m) => m !== null)
        .map((m) => m[1]);

    const links = [];
    let platform = null;
    let meta = {};

    const sections = document.querySelectorAll('#download .platformDownload, #download .platformMeta, #download .buttons');
    for (const elem of sections) {
        if (elem.classList.contains('art')) {
            continue;
        }
        if (elem.classList.contains('platformDownload')) {
            platform = elem.id || null;
            meta = {};
            continue;
        }
        if (elem.classList.contains('platformMeta')) {
            meta = {};
            for (const li of Array.from(elem.children)) {
                if (li.children.length >= 2) {
                    meta[li.children[0].innerText.trim()] = li.children[1].innerText.trim();
                }
            }
            continue;
        }
        for (const a of Array.from(elem.querySelectorAll('a'))) {
            const languages = languagesOf(a);
            const clone = a.cloneNode(true);
            clone.querySelectorAll('span').forEach((span) => span.remove());
            const info = clone.textContent.trim();
            links.push({
                url: a.href,
                platform,
                info: info.length > 0 ? info : null,
                languages,
                meta: { ...meta },
            });
        }
    }
    return links;
})()
"#;
