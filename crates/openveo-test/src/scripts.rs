//! Scripts executed in page context.
//!
//! Arguments are always passed through `arguments[n]`, never spliced into the
//! source, so a script constant identifies the operation whatever its inputs.

/// Scroll the page content wrapper: `(wrapper, top)`
pub const SCROLL_TOP: &str = "arguments[0].scrollTop = arguments[1];";

/// Set an input value through AngularJS and notify its model: `(input, value)`
pub const SET_INPUT_VALUE: &str = "var fieldElement = angular.element(arguments[0]); \
fieldElement.val(arguments[1]); \
fieldElement.triggerHandler('input');";

/// Disable CSS transitions for the rest of the page life
pub const DISABLE_ANIMATIONS: &str = "var style = document.createElement('style'); \
style.type = 'text/css'; \
style.innerHTML = '* { -webkit-transition: none !important; transition: none !important; }'; \
document.getElementsByTagName('head')[0].appendChild(style);";

/// Set the time of a time picker: `(input, \"hh:mm:ss\")`
pub const SET_TIME: &str = "var scope = angular.element(arguments[0]).scope(); \
var parts = arguments[1].split(':'); \
scope.editTime = new Date(1970, 0, 1, parts[0], parts[1], parts[2]); \
scope.$apply();";

/// Content of the active TinyMCE editor
pub const TINYMCE_GET_CONTENT: &str = "return tinyMCE.activeEditor.getContent();";

/// Replace the content of the active TinyMCE editor: `(html)`
pub const TINYMCE_SET_CONTENT: &str = "return tinyMCE.activeEditor.setContent(arguments[0]);";

/// Insert content at the caret of the active TinyMCE editor: `(html)`
pub const TINYMCE_INSERT_CONTENT: &str = "return tinyMCE.activeEditor.insertContent(arguments[0]);";

/// Synchronous XMLHttpRequest: `(method, url, body)` returning `{status, body}`
pub const SEND_REQUEST: &str = "var xhr = new XMLHttpRequest(); \
xhr.open(arguments[0], arguments[1], false); \
xhr.setRequestHeader('Content-Type', 'application/json'); \
xhr.send(arguments[2] === null ? null : JSON.stringify(arguments[2])); \
return {status: xhr.status, body: xhr.responseText};";
