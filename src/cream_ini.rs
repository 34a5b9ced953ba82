//! cream_api.ini generation
//!
//! CreamAPI reads this file next to the proxied steam_api DLL. The template
//! text is reproduced exactly; only the App ID and the `[dlc]` body vary.

use serde::{Deserialize, Serialize};

pub const CREAM_API_INI: &str = "cream_api.ini";

pub const APP_ID_PLACEHOLDER: &str = "{APPID}";
pub const DLCS_PLACEHOLDER: &str = "{DLCS}";

pub const CREAM_API_INI_TEMPLATE: &str = r#"[steam]
; Application ID (http://store.steampowered.com/app/%appid%/)
appid = {APPID}
; Current game language.
; Uncomment this option to turn it on.
; Default is "english".
;language = german
; Enable/disable automatic DLC unlock. Default option is set to "false".
; Keep in mind that this option WON'T work properly if the "[dlc]" section is NOT empty
unlockall = false
; Original Valve's steam_api.dll.
; Default is "steam_api_o.dll".
orgapi = steam_api_o.dll
; Original Valve's steam_api64.dll.
; Default is "steam_api64_o.dll".
orgapi64 = steam_api64_o.dll
; Enable/disable extra protection bypasser.
; Default is "false".
extraprotection = false
; The game will think that you're offline (supported by some games).
; Default is "false".
forceoffline = false
; Some games are checking for the low violence presence.
; Default is "false".
;lowviolence = true
; Purchase timestamp for the DLC (http://www.onlineconversion.com/unix_time.htm).
; Default is "0" (1970/01/01).
;purchasetimestamp = 0
[steam_misc]
; Disables the internal SteamUser interface handler.
; Does have an effect on the games that are using the license check for the DLC/application.
; Default is "false".
disableuserinterface = false
[dlc]
; DLC handling.
; Format: <dlc_id> = <dlc_description>
; e.g. : 247295 = Saints Row IV - GAT V Pack
; If the DLC is not specified in this section
; then it won't be unlocked
{DLCS}"#;

/// One downloadable content item
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DlcEntry {
    pub id: u64,
    pub name: String,
}

impl DlcEntry {
    /// The `[dlc]` section line for this entry
    pub fn to_ini_line(&self) -> String {
        format!("{} = {}", self.id, self.name)
    }
}

/// Render the cream_api.ini text for `app_id` with the given DLCs.
///
/// The DLC block is one `<id> = <name>` line per entry joined by `\n`,
/// followed by a single trailing newline.
pub fn render(app_id: u32, dlcs: &[DlcEntry]) -> String {
    debug_assert!(CREAM_API_INI_TEMPLATE.contains(APP_ID_PLACEHOLDER));
    debug_assert!(CREAM_API_INI_TEMPLATE.contains(DLCS_PLACEHOLDER));

    let mut block = dlcs
        .iter()
        .map(DlcEntry::to_ini_line)
        .collect::<Vec<_>>()
        .join("\n");
    block.push('\n');

    CREAM_API_INI_TEMPLATE
        .replace(APP_ID_PLACEHOLDER, &app_id.to_string())
        .replace(DLCS_PLACEHOLDER, &block)
}
